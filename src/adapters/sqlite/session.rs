//! SQLite session: one transaction on the shared connection

use crate::adapters::database::traits::{
    BillableRepository, ClientRepository, ProviderRepository, SessionMode, StoreSession,
    VisitRepository,
};
use crate::adapters::sqlite::client::map_sqlite_error;
use crate::domain::{
    Billable, BillableCode, BillableUpdate, Client, ClientId, DatabaseError, ImageId, NewClient,
    NewProvider, NewVisitImage, Provider, ProviderId, Result, Visit, VisitDetail, VisitDetailId,
    VisitFields, VisitId, VisitImage, VisitImageMeta,
};
use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::sync::OwnedMutexGuard;

const CLIENT_COLUMNS: &str = "ClientId, FirstName, LastName, DOB, Phone, Email, Address";
const PROVIDER_COLUMNS: &str = "ProviderId, FirstName, LastName, Specialty, Phone, Email";
const VISIT_COLUMNS: &str = "VisitId, ClientId, ProviderId, VisitDate, Paid, Notes";

/// Transaction holding the connection lock until commit, rollback or drop
pub struct SqliteSession {
    conn: OwnedMutexGuard<Connection>,
    mode: SessionMode,
    finished: bool,
}

impl SqliteSession {
    /// Start a transaction on an already locked connection
    ///
    /// Write sessions take the database write lock up front (`BEGIN IMMEDIATE`)
    /// so a check made inside the session cannot be invalidated by another
    /// writer before the session commits.
    pub(crate) fn begin(conn: OwnedMutexGuard<Connection>, mode: SessionMode) -> Result<Self> {
        let statement = match mode {
            SessionMode::Read => "BEGIN DEFERRED",
            SessionMode::Write => "BEGIN IMMEDIATE",
        };
        conn.execute_batch(statement)
            .map_err(|e| DatabaseError::Transaction(format!("{statement} failed: {e}")))?;

        Ok(Self {
            conn,
            mode,
            finished: false,
        })
    }

    fn finish(&mut self, statement: &str) -> Result<()> {
        self.conn
            .execute_batch(statement)
            .map_err(|e| DatabaseError::Transaction(format!("{statement} failed: {e}")))?;
        self.finished = true;
        Ok(())
    }

    fn exists(&self, sql: &str, key: &dyn rusqlite::ToSql) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(sql, &[key], |row| row.get(0))
            .optional()
            .map_err(map_sqlite_error)?;
        Ok(found.is_some())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.conn.execute_batch("ROLLBACK") {
                tracing::warn!(error = %e, "Rollback of abandoned SQLite session failed");
            } else {
                tracing::debug!("Rolled back abandoned SQLite session");
            }
        }
    }
}

fn code_from_row(row: &Row<'_>, idx: usize) -> rusqlite::Result<BillableCode> {
    let raw: String = row.get(idx)?;
    BillableCode::new(raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        client_id: ClientId::new(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        dob: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
        address: row.get(6)?,
    })
}

fn provider_from_row(row: &Row<'_>) -> rusqlite::Result<Provider> {
    Ok(Provider {
        provider_id: ProviderId::new(row.get(0)?),
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        specialty: row.get(3)?,
        phone: row.get(4)?,
        email: row.get(5)?,
    })
}

fn billable_from_row(row: &Row<'_>) -> rusqlite::Result<Billable> {
    Ok(Billable {
        billable_code: code_from_row(row, 0)?,
        description: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        cost: row.get::<_, Option<f64>>(2)?.unwrap_or_default(),
    })
}

fn visit_from_row(row: &Row<'_>) -> rusqlite::Result<Visit> {
    Ok(Visit {
        visit_id: VisitId::new(row.get(0)?),
        client_id: ClientId::new(row.get(1)?),
        provider_id: ProviderId::new(row.get(2)?),
        visit_date: row.get(3)?,
        paid: row.get::<_, i64>(4)? != 0,
        notes: row.get(5)?,
    })
}

#[async_trait]
impl ClientRepository for SqliteSession {
    async fn client_exists(&mut self, id: ClientId) -> Result<bool> {
        self.exists("SELECT 1 FROM Clients WHERE ClientId = ?1", &id.get())
    }

    async fn get_client(&mut self, id: ClientId) -> Result<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM Clients WHERE ClientId = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id.get()], client_from_row)
            .optional()
            .map_err(map_sqlite_error)?)
    }

    async fn list_clients(&mut self) -> Result<Vec<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM Clients ORDER BY ClientId");
        let mut stmt = self.conn.prepare(&sql).map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], client_from_row)
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        Ok(rows)
    }

    async fn insert_client(&mut self, client: &NewClient) -> Result<ClientId> {
        self.conn
            .execute(
                "INSERT INTO Clients (FirstName, LastName, DOB, Phone, Email, Address)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    client.first_name,
                    client.last_name,
                    client.dob,
                    client.phone,
                    client.email,
                    client.address
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(ClientId::new(self.conn.last_insert_rowid()))
    }

    async fn update_client(&mut self, id: ClientId, client: &NewClient) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE Clients SET FirstName = ?1, LastName = ?2, DOB = ?3, Phone = ?4,
                 Email = ?5, Address = ?6 WHERE ClientId = ?7",
                params![
                    client.first_name,
                    client.last_name,
                    client.dob,
                    client.phone,
                    client.email,
                    client.address,
                    id.get()
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(changed > 0)
    }

    async fn delete_client(&mut self, id: ClientId) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM Clients WHERE ClientId = ?1", params![id.get()])
            .map_err(map_sqlite_error)?;
        Ok(removed as u64)
    }
}

#[async_trait]
impl ProviderRepository for SqliteSession {
    async fn provider_exists(&mut self, id: ProviderId) -> Result<bool> {
        self.exists("SELECT 1 FROM Providers WHERE ProviderId = ?1", &id.get())
    }

    async fn get_provider(&mut self, id: ProviderId) -> Result<Option<Provider>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM Providers WHERE ProviderId = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id.get()], provider_from_row)
            .optional()
            .map_err(map_sqlite_error)?)
    }

    async fn list_providers(&mut self) -> Result<Vec<Provider>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM Providers ORDER BY ProviderId");
        let mut stmt = self.conn.prepare(&sql).map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], provider_from_row)
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        Ok(rows)
    }

    async fn insert_provider(&mut self, provider: &NewProvider) -> Result<ProviderId> {
        self.conn
            .execute(
                "INSERT INTO Providers (FirstName, LastName, Specialty, Phone, Email)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    provider.first_name,
                    provider.last_name,
                    provider.specialty,
                    provider.phone,
                    provider.email
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(ProviderId::new(self.conn.last_insert_rowid()))
    }

    async fn update_provider(&mut self, id: ProviderId, provider: &NewProvider) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE Providers SET FirstName = ?1, LastName = ?2, Specialty = ?3, Phone = ?4,
                 Email = ?5 WHERE ProviderId = ?6",
                params![
                    provider.first_name,
                    provider.last_name,
                    provider.specialty,
                    provider.phone,
                    provider.email,
                    id.get()
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(changed > 0)
    }

    async fn delete_provider(&mut self, id: ProviderId) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM Providers WHERE ProviderId = ?1", params![id.get()])
            .map_err(map_sqlite_error)?;
        Ok(removed as u64)
    }
}

#[async_trait]
impl BillableRepository for SqliteSession {
    async fn billable_exists(&mut self, code: &BillableCode) -> Result<bool> {
        self.exists("SELECT 1 FROM Billables WHERE BillableCode = ?1", &code.as_str())
    }

    async fn get_billable(&mut self, code: &BillableCode) -> Result<Option<Billable>> {
        Ok(self
            .conn
            .query_row(
                "SELECT BillableCode, Description, Cost FROM Billables WHERE BillableCode = ?1",
                params![code.as_str()],
                billable_from_row,
            )
            .optional()
            .map_err(map_sqlite_error)?)
    }

    async fn list_billables(&mut self) -> Result<Vec<Billable>> {
        let mut stmt = self
            .conn
            .prepare("SELECT BillableCode, Description, Cost FROM Billables ORDER BY BillableCode")
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], billable_from_row)
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        Ok(rows)
    }

    async fn insert_billable(&mut self, billable: &Billable) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO Billables (BillableCode, Description, Cost) VALUES (?1, ?2, ?3)",
                params![
                    billable.billable_code.as_str(),
                    billable.description,
                    billable.cost
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(())
    }

    async fn insert_billable_if_absent(&mut self, billable: &Billable) -> Result<bool> {
        let inserted = self
            .conn
            .execute(
                "INSERT INTO Billables (BillableCode, Description, Cost) VALUES (?1, ?2, ?3)
                 ON CONFLICT (BillableCode) DO NOTHING",
                params![
                    billable.billable_code.as_str(),
                    billable.description,
                    billable.cost
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(inserted > 0)
    }

    async fn upsert_billable(&mut self, billable: &Billable) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO Billables (BillableCode, Description, Cost) VALUES (?1, ?2, ?3)
                 ON CONFLICT (BillableCode) DO UPDATE
                 SET Description = excluded.Description, Cost = excluded.Cost",
                params![
                    billable.billable_code.as_str(),
                    billable.description,
                    billable.cost
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(())
    }

    async fn update_billable(
        &mut self,
        code: &BillableCode,
        update: &BillableUpdate,
    ) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE Billables SET Description = ?1, Cost = ?2 WHERE BillableCode = ?3",
                params![update.description, update.cost, code.as_str()],
            )
            .map_err(map_sqlite_error)?;
        Ok(changed > 0)
    }

    async fn delete_billable(&mut self, code: &BillableCode) -> Result<u64> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM Billables WHERE BillableCode = ?1",
                params![code.as_str()],
            )
            .map_err(map_sqlite_error)?;
        Ok(removed as u64)
    }
}

#[async_trait]
impl VisitRepository for SqliteSession {
    async fn insert_visit(&mut self, fields: &VisitFields) -> Result<VisitId> {
        self.conn
            .execute(
                "INSERT INTO Visits (ClientId, ProviderId, VisitDate, Paid, Notes)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    fields.client_id.get(),
                    fields.provider_id.get(),
                    fields.visit_date,
                    fields.paid as i64,
                    fields.notes
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(VisitId::new(self.conn.last_insert_rowid()))
    }

    async fn get_visit(&mut self, id: VisitId) -> Result<Option<Visit>> {
        let sql = format!("SELECT {VISIT_COLUMNS} FROM Visits WHERE VisitId = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![id.get()], visit_from_row)
            .optional()
            .map_err(map_sqlite_error)?)
    }

    async fn list_visits(&mut self) -> Result<Vec<Visit>> {
        let sql = format!("SELECT {VISIT_COLUMNS} FROM Visits ORDER BY VisitId");
        let mut stmt = self.conn.prepare(&sql).map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map([], visit_from_row)
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        Ok(rows)
    }

    async fn update_visit(&mut self, id: VisitId, fields: &VisitFields) -> Result<bool> {
        let changed = self
            .conn
            .execute(
                "UPDATE Visits SET ClientId = ?1, ProviderId = ?2, VisitDate = ?3, Paid = ?4,
                 Notes = ?5 WHERE VisitId = ?6",
                params![
                    fields.client_id.get(),
                    fields.provider_id.get(),
                    fields.visit_date,
                    fields.paid as i64,
                    fields.notes,
                    id.get()
                ],
            )
            .map_err(map_sqlite_error)?;
        Ok(changed > 0)
    }

    async fn insert_visit_detail(
        &mut self,
        visit_id: VisitId,
        code: &BillableCode,
        quantity: i64,
    ) -> Result<VisitDetailId> {
        self.conn
            .execute(
                "INSERT INTO VisitDetails (VisitId, BillableCode, Quantity) VALUES (?1, ?2, ?3)",
                params![visit_id.get(), code.as_str(), quantity],
            )
            .map_err(map_sqlite_error)?;
        Ok(VisitDetailId::new(self.conn.last_insert_rowid()))
    }

    async fn list_visit_details(&mut self, visit_id: VisitId) -> Result<Vec<VisitDetail>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT VisitDetailId, VisitId, BillableCode, Quantity FROM VisitDetails
                 WHERE VisitId = ?1 ORDER BY VisitDetailId",
            )
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(params![visit_id.get()], |row| {
                Ok(VisitDetail {
                    visit_detail_id: VisitDetailId::new(row.get(0)?),
                    visit_id: VisitId::new(row.get(1)?),
                    billable_code: code_from_row(row, 2)?,
                    quantity: row.get(3)?,
                })
            })
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        Ok(rows)
    }

    async fn insert_visit_image(
        &mut self,
        visit_id: VisitId,
        image: &NewVisitImage,
    ) -> Result<ImageId> {
        self.conn
            .execute(
                "INSERT INTO VisitImages (VisitId, ImageName, ImageType, ImageData)
                 VALUES (?1, ?2, ?3, ?4)",
                params![visit_id.get(), image.name, image.mime_type, image.data],
            )
            .map_err(map_sqlite_error)?;
        Ok(ImageId::new(self.conn.last_insert_rowid()))
    }

    async fn list_visit_images(&mut self, visit_id: VisitId) -> Result<Vec<VisitImageMeta>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT ImageId, ImageName, ImageType FROM VisitImages
                 WHERE VisitId = ?1 ORDER BY ImageId",
            )
            .map_err(map_sqlite_error)?;
        let rows = stmt
            .query_map(params![visit_id.get()], |row| {
                Ok(VisitImageMeta {
                    image_id: ImageId::new(row.get(0)?),
                    image_name: row.get(1)?,
                    image_type: row.get(2)?,
                })
            })
            .map_err(map_sqlite_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sqlite_error)?;
        Ok(rows)
    }

    async fn get_visit_image(&mut self, id: ImageId) -> Result<Option<VisitImage>> {
        Ok(self
            .conn
            .query_row(
                "SELECT ImageId, VisitId, ImageName, ImageType, ImageData FROM VisitImages
                 WHERE ImageId = ?1",
                params![id.get()],
                |row| {
                    Ok(VisitImage {
                        image_id: ImageId::new(row.get(0)?),
                        visit_id: VisitId::new(row.get(1)?),
                        image_name: row.get(2)?,
                        image_type: row.get(3)?,
                        image_data: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(map_sqlite_error)?)
    }

    async fn delete_visit_details(&mut self, visit_id: VisitId) -> Result<u64> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM VisitDetails WHERE VisitId = ?1",
                params![visit_id.get()],
            )
            .map_err(map_sqlite_error)?;
        Ok(removed as u64)
    }

    async fn delete_visit_images(&mut self, visit_id: VisitId) -> Result<u64> {
        let removed = self
            .conn
            .execute(
                "DELETE FROM VisitImages WHERE VisitId = ?1",
                params![visit_id.get()],
            )
            .map_err(map_sqlite_error)?;
        Ok(removed as u64)
    }

    async fn delete_visit(&mut self, id: VisitId) -> Result<u64> {
        let removed = self
            .conn
            .execute("DELETE FROM Visits WHERE VisitId = ?1", params![id.get()])
            .map_err(map_sqlite_error)?;
        Ok(removed as u64)
    }
}

#[async_trait]
impl StoreSession for SqliteSession {
    fn mode(&self) -> SessionMode {
        self.mode
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finish("COMMIT")
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finish("ROLLBACK")
    }
}
