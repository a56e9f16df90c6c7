//! PostgreSQL session: one transaction on one pooled connection

use crate::adapters::database::traits::{
    BillableRepository, ClientRepository, ProviderRepository, SessionMode, StoreSession,
    VisitRepository,
};
use crate::adapters::postgresql::client::map_pg_error;
use crate::domain::{
    Billable, BillableCode, BillableUpdate, Client, ClientId, DatabaseError, ImageId, NewClient,
    NewProvider, NewVisitImage, PracticeError, Provider, ProviderId, Result, Visit, VisitDetail,
    VisitDetailId, VisitFields, VisitId, VisitImage, VisitImageMeta,
};
use async_trait::async_trait;
use deadpool_postgres::Object;
use tokio_postgres::types::{FromSql, ToSql};
use tokio_postgres::Row;

/// Key of the transaction-scoped advisory lock taken by write sessions
pub const WRITE_LOCK_KEY: i64 = 0x5052_4143_5449_4345;

const CLIENT_COLUMNS: &str = "ClientId, FirstName, LastName, DOB, Phone, Email, Address";
const PROVIDER_COLUMNS: &str = "ProviderId, FirstName, LastName, Specialty, Phone, Email";
const VISIT_COLUMNS: &str = "VisitId, ClientId, ProviderId, VisitDate, Paid, Notes";

type Params<'a> = &'a [&'a (dyn ToSql + Sync)];

/// Transaction on a pooled connection
///
/// The connection goes back to the pool on commit or rollback. A session
/// dropped while still open has its rollback spawned on the current runtime;
/// without a runtime the connection is detached from the pool and closed.
pub struct PostgreSQLSession {
    conn: Option<Object>,
    mode: SessionMode,
}

impl PostgreSQLSession {
    /// Start a transaction
    ///
    /// Write sessions take [`WRITE_LOCK_KEY`] with `pg_advisory_xact_lock`, so
    /// they run one at a time across every process sharing the database. Read
    /// sessions see one snapshot.
    pub(crate) async fn begin(
        conn: Object,
        mode: SessionMode,
        statement_timeout_seconds: u64,
    ) -> Result<Self> {
        let begin = match mode {
            SessionMode::Read => "BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY",
            SessionMode::Write => "BEGIN",
        };
        conn.batch_execute(begin)
            .await
            .map_err(|e| DatabaseError::Transaction(format!("{begin} failed: {e}")))?;

        let session = Self {
            conn: Some(conn),
            mode,
        };

        let client = session.client()?;
        client
            .batch_execute(&format!(
                "SET LOCAL statement_timeout = {}",
                statement_timeout_seconds * 1000
            ))
            .await
            .map_err(map_pg_error)?;

        if mode == SessionMode::Write {
            client
                .execute("SELECT pg_advisory_xact_lock($1)", &[&WRITE_LOCK_KEY])
                .await
                .map_err(map_pg_error)?;
        }

        Ok(session)
    }

    fn client(&self) -> Result<&Object> {
        self.conn.as_ref().ok_or_else(|| {
            PracticeError::Database(DatabaseError::Transaction(
                "session already finished".to_string(),
            ))
        })
    }

    async fn finish(&mut self, statement: &str) -> Result<()> {
        let conn = self.conn.take().ok_or_else(|| {
            PracticeError::Database(DatabaseError::Transaction(
                "session already finished".to_string(),
            ))
        })?;
        conn.batch_execute(statement)
            .await
            .map_err(|e| DatabaseError::Transaction(format!("{statement} failed: {e}")))?;
        Ok(())
    }

    async fn query_opt(&self, sql: &str, params: Params<'_>) -> Result<Option<Row>> {
        Ok(self
            .client()?
            .query_opt(sql, params)
            .await
            .map_err(map_pg_error)?)
    }

    async fn query(&self, sql: &str, params: Params<'_>) -> Result<Vec<Row>> {
        Ok(self
            .client()?
            .query(sql, params)
            .await
            .map_err(map_pg_error)?)
    }

    async fn execute(&self, sql: &str, params: Params<'_>) -> Result<u64> {
        Ok(self
            .client()?
            .execute(sql, params)
            .await
            .map_err(map_pg_error)?)
    }

    async fn insert_returning_id(&self, sql: &str, params: Params<'_>) -> Result<i64> {
        let row = self
            .client()?
            .query_one(sql, params)
            .await
            .map_err(map_pg_error)?;
        column(&row, 0)
    }
}

impl Drop for PostgreSQLSession {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = conn.batch_execute("ROLLBACK").await {
                        tracing::warn!(error = %e, "Rollback of abandoned PostgreSQL session failed");
                    }
                });
            }
            Err(_) => {
                tracing::warn!("No runtime to roll back abandoned session; closing connection");
                drop(Object::take(conn));
            }
        }
    }
}

fn column<'a, T: FromSql<'a>>(row: &'a Row, idx: usize) -> Result<T> {
    row.try_get(idx).map_err(|e| map_pg_error(e).into())
}

fn code_column(row: &Row, idx: usize) -> Result<BillableCode> {
    let raw: String = column(row, idx)?;
    BillableCode::new(raw).map_err(|e| DatabaseError::QueryFailed(e).into())
}

fn client_from_row(row: &Row) -> Result<Client> {
    Ok(Client {
        client_id: ClientId::new(column(row, 0)?),
        first_name: column(row, 1)?,
        last_name: column(row, 2)?,
        dob: column(row, 3)?,
        phone: column(row, 4)?,
        email: column(row, 5)?,
        address: column(row, 6)?,
    })
}

fn provider_from_row(row: &Row) -> Result<Provider> {
    Ok(Provider {
        provider_id: ProviderId::new(column(row, 0)?),
        first_name: column(row, 1)?,
        last_name: column(row, 2)?,
        specialty: column(row, 3)?,
        phone: column(row, 4)?,
        email: column(row, 5)?,
    })
}

fn billable_from_row(row: &Row) -> Result<Billable> {
    Ok(Billable {
        billable_code: code_column(row, 0)?,
        description: column(row, 1)?,
        cost: column(row, 2)?,
    })
}

/// `Visits.Paid` is a 0/1 SMALLINT, matching the SQLite column
fn paid_flag(paid: bool) -> i16 {
    i16::from(paid)
}

fn visit_from_row(row: &Row) -> Result<Visit> {
    Ok(Visit {
        visit_id: VisitId::new(column(row, 0)?),
        client_id: ClientId::new(column(row, 1)?),
        provider_id: ProviderId::new(column(row, 2)?),
        visit_date: column(row, 3)?,
        paid: column::<i16>(row, 4)? != 0,
        notes: column(row, 5)?,
    })
}

#[async_trait]
impl ClientRepository for PostgreSQLSession {
    async fn client_exists(&mut self, id: ClientId) -> Result<bool> {
        let row = self
            .query_opt("SELECT 1 FROM Clients WHERE ClientId = $1", &[&id.get()])
            .await?;
        Ok(row.is_some())
    }

    async fn get_client(&mut self, id: ClientId) -> Result<Option<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM Clients WHERE ClientId = $1");
        self.query_opt(&sql, &[&id.get()])
            .await?
            .as_ref()
            .map(client_from_row)
            .transpose()
    }

    async fn list_clients(&mut self) -> Result<Vec<Client>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM Clients ORDER BY ClientId");
        self.query(&sql, &[]).await?.iter().map(client_from_row).collect()
    }

    async fn insert_client(&mut self, client: &NewClient) -> Result<ClientId> {
        let id = self
            .insert_returning_id(
                "INSERT INTO Clients (FirstName, LastName, DOB, Phone, Email, Address)
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING ClientId",
                &[
                    &client.first_name,
                    &client.last_name,
                    &client.dob,
                    &client.phone,
                    &client.email,
                    &client.address,
                ],
            )
            .await?;
        Ok(ClientId::new(id))
    }

    async fn update_client(&mut self, id: ClientId, client: &NewClient) -> Result<bool> {
        let changed = self
            .execute(
                "UPDATE Clients SET FirstName = $1, LastName = $2, DOB = $3, Phone = $4,
                 Email = $5, Address = $6 WHERE ClientId = $7",
                &[
                    &client.first_name,
                    &client.last_name,
                    &client.dob,
                    &client.phone,
                    &client.email,
                    &client.address,
                    &id.get(),
                ],
            )
            .await?;
        Ok(changed > 0)
    }

    async fn delete_client(&mut self, id: ClientId) -> Result<u64> {
        self.execute("DELETE FROM Clients WHERE ClientId = $1", &[&id.get()])
            .await
    }
}

#[async_trait]
impl ProviderRepository for PostgreSQLSession {
    async fn provider_exists(&mut self, id: ProviderId) -> Result<bool> {
        let row = self
            .query_opt("SELECT 1 FROM Providers WHERE ProviderId = $1", &[&id.get()])
            .await?;
        Ok(row.is_some())
    }

    async fn get_provider(&mut self, id: ProviderId) -> Result<Option<Provider>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM Providers WHERE ProviderId = $1");
        self.query_opt(&sql, &[&id.get()])
            .await?
            .as_ref()
            .map(provider_from_row)
            .transpose()
    }

    async fn list_providers(&mut self) -> Result<Vec<Provider>> {
        let sql = format!("SELECT {PROVIDER_COLUMNS} FROM Providers ORDER BY ProviderId");
        self.query(&sql, &[]).await?.iter().map(provider_from_row).collect()
    }

    async fn insert_provider(&mut self, provider: &NewProvider) -> Result<ProviderId> {
        let id = self
            .insert_returning_id(
                "INSERT INTO Providers (FirstName, LastName, Specialty, Phone, Email)
                 VALUES ($1, $2, $3, $4, $5) RETURNING ProviderId",
                &[
                    &provider.first_name,
                    &provider.last_name,
                    &provider.specialty,
                    &provider.phone,
                    &provider.email,
                ],
            )
            .await?;
        Ok(ProviderId::new(id))
    }

    async fn update_provider(&mut self, id: ProviderId, provider: &NewProvider) -> Result<bool> {
        let changed = self
            .execute(
                "UPDATE Providers SET FirstName = $1, LastName = $2, Specialty = $3, Phone = $4,
                 Email = $5 WHERE ProviderId = $6",
                &[
                    &provider.first_name,
                    &provider.last_name,
                    &provider.specialty,
                    &provider.phone,
                    &provider.email,
                    &id.get(),
                ],
            )
            .await?;
        Ok(changed > 0)
    }

    async fn delete_provider(&mut self, id: ProviderId) -> Result<u64> {
        self.execute("DELETE FROM Providers WHERE ProviderId = $1", &[&id.get()])
            .await
    }
}

#[async_trait]
impl BillableRepository for PostgreSQLSession {
    async fn billable_exists(&mut self, code: &BillableCode) -> Result<bool> {
        let row = self
            .query_opt(
                "SELECT 1 FROM Billables WHERE BillableCode = $1",
                &[&code.as_str()],
            )
            .await?;
        Ok(row.is_some())
    }

    async fn get_billable(&mut self, code: &BillableCode) -> Result<Option<Billable>> {
        self.query_opt(
            "SELECT BillableCode, Description, Cost FROM Billables WHERE BillableCode = $1",
            &[&code.as_str()],
        )
        .await?
        .as_ref()
        .map(billable_from_row)
        .transpose()
    }

    async fn list_billables(&mut self) -> Result<Vec<Billable>> {
        self.query(
            "SELECT BillableCode, Description, Cost FROM Billables ORDER BY BillableCode",
            &[],
        )
        .await?
        .iter()
        .map(billable_from_row)
        .collect()
    }

    async fn insert_billable(&mut self, billable: &Billable) -> Result<()> {
        self.execute(
            "INSERT INTO Billables (BillableCode, Description, Cost) VALUES ($1, $2, $3)",
            &[
                &billable.billable_code.as_str(),
                &billable.description,
                &billable.cost,
            ],
        )
        .await?;
        Ok(())
    }

    async fn insert_billable_if_absent(&mut self, billable: &Billable) -> Result<bool> {
        let inserted = self
            .execute(
                "INSERT INTO Billables (BillableCode, Description, Cost) VALUES ($1, $2, $3)
                 ON CONFLICT (BillableCode) DO NOTHING",
                &[
                    &billable.billable_code.as_str(),
                    &billable.description,
                    &billable.cost,
                ],
            )
            .await?;
        Ok(inserted > 0)
    }

    async fn upsert_billable(&mut self, billable: &Billable) -> Result<()> {
        self.execute(
            "INSERT INTO Billables (BillableCode, Description, Cost) VALUES ($1, $2, $3)
             ON CONFLICT (BillableCode) DO UPDATE
             SET Description = EXCLUDED.Description, Cost = EXCLUDED.Cost",
            &[
                &billable.billable_code.as_str(),
                &billable.description,
                &billable.cost,
            ],
        )
        .await?;
        Ok(())
    }

    async fn update_billable(
        &mut self,
        code: &BillableCode,
        update: &BillableUpdate,
    ) -> Result<bool> {
        let changed = self
            .execute(
                "UPDATE Billables SET Description = $1, Cost = $2 WHERE BillableCode = $3",
                &[&update.description, &update.cost, &code.as_str()],
            )
            .await?;
        Ok(changed > 0)
    }

    async fn delete_billable(&mut self, code: &BillableCode) -> Result<u64> {
        self.execute(
            "DELETE FROM Billables WHERE BillableCode = $1",
            &[&code.as_str()],
        )
        .await
    }
}

#[async_trait]
impl VisitRepository for PostgreSQLSession {
    async fn insert_visit(&mut self, fields: &VisitFields) -> Result<VisitId> {
        let id = self
            .insert_returning_id(
                "INSERT INTO Visits (ClientId, ProviderId, VisitDate, Paid, Notes)
                 VALUES ($1, $2, $3, $4, $5) RETURNING VisitId",
                &[
                    &fields.client_id.get(),
                    &fields.provider_id.get(),
                    &fields.visit_date,
                    &paid_flag(fields.paid),
                    &fields.notes,
                ],
            )
            .await?;
        Ok(VisitId::new(id))
    }

    async fn get_visit(&mut self, id: VisitId) -> Result<Option<Visit>> {
        let sql = format!("SELECT {VISIT_COLUMNS} FROM Visits WHERE VisitId = $1");
        self.query_opt(&sql, &[&id.get()])
            .await?
            .as_ref()
            .map(visit_from_row)
            .transpose()
    }

    async fn list_visits(&mut self) -> Result<Vec<Visit>> {
        let sql = format!("SELECT {VISIT_COLUMNS} FROM Visits ORDER BY VisitId");
        self.query(&sql, &[]).await?.iter().map(visit_from_row).collect()
    }

    async fn update_visit(&mut self, id: VisitId, fields: &VisitFields) -> Result<bool> {
        let changed = self
            .execute(
                "UPDATE Visits SET ClientId = $1, ProviderId = $2, VisitDate = $3, Paid = $4,
                 Notes = $5 WHERE VisitId = $6",
                &[
                    &fields.client_id.get(),
                    &fields.provider_id.get(),
                    &fields.visit_date,
                    &paid_flag(fields.paid),
                    &fields.notes,
                    &id.get(),
                ],
            )
            .await?;
        Ok(changed > 0)
    }

    async fn insert_visit_detail(
        &mut self,
        visit_id: VisitId,
        code: &BillableCode,
        quantity: i64,
    ) -> Result<VisitDetailId> {
        let id = self
            .insert_returning_id(
                "INSERT INTO VisitDetails (VisitId, BillableCode, Quantity)
                 VALUES ($1, $2, $3) RETURNING VisitDetailId",
                &[&visit_id.get(), &code.as_str(), &quantity],
            )
            .await?;
        Ok(VisitDetailId::new(id))
    }

    async fn list_visit_details(&mut self, visit_id: VisitId) -> Result<Vec<VisitDetail>> {
        self.query(
            "SELECT VisitDetailId, VisitId, BillableCode, Quantity FROM VisitDetails
             WHERE VisitId = $1 ORDER BY VisitDetailId",
            &[&visit_id.get()],
        )
        .await?
        .iter()
        .map(|row| {
            Ok(VisitDetail {
                visit_detail_id: VisitDetailId::new(column(row, 0)?),
                visit_id: VisitId::new(column(row, 1)?),
                billable_code: code_column(row, 2)?,
                quantity: column(row, 3)?,
            })
        })
        .collect()
    }

    async fn insert_visit_image(
        &mut self,
        visit_id: VisitId,
        image: &NewVisitImage,
    ) -> Result<ImageId> {
        let id = self
            .insert_returning_id(
                "INSERT INTO VisitImages (VisitId, ImageName, ImageType, ImageData)
                 VALUES ($1, $2, $3, $4) RETURNING ImageId",
                &[&visit_id.get(), &image.name, &image.mime_type, &image.data],
            )
            .await?;
        Ok(ImageId::new(id))
    }

    async fn list_visit_images(&mut self, visit_id: VisitId) -> Result<Vec<VisitImageMeta>> {
        self.query(
            "SELECT ImageId, ImageName, ImageType FROM VisitImages
             WHERE VisitId = $1 ORDER BY ImageId",
            &[&visit_id.get()],
        )
        .await?
        .iter()
        .map(|row| {
            Ok(VisitImageMeta {
                image_id: ImageId::new(column(row, 0)?),
                image_name: column(row, 1)?,
                image_type: column(row, 2)?,
            })
        })
        .collect()
    }

    async fn get_visit_image(&mut self, id: ImageId) -> Result<Option<VisitImage>> {
        self.query_opt(
            "SELECT ImageId, VisitId, ImageName, ImageType, ImageData FROM VisitImages
             WHERE ImageId = $1",
            &[&id.get()],
        )
        .await?
        .as_ref()
        .map(|row| {
            Ok(VisitImage {
                image_id: ImageId::new(column(row, 0)?),
                visit_id: VisitId::new(column(row, 1)?),
                image_name: column(row, 2)?,
                image_type: column(row, 3)?,
                image_data: column(row, 4)?,
            })
        })
        .transpose()
    }

    async fn delete_visit_details(&mut self, visit_id: VisitId) -> Result<u64> {
        self.execute(
            "DELETE FROM VisitDetails WHERE VisitId = $1",
            &[&visit_id.get()],
        )
        .await
    }

    async fn delete_visit_images(&mut self, visit_id: VisitId) -> Result<u64> {
        self.execute(
            "DELETE FROM VisitImages WHERE VisitId = $1",
            &[&visit_id.get()],
        )
        .await
    }

    async fn delete_visit(&mut self, id: VisitId) -> Result<u64> {
        self.execute("DELETE FROM Visits WHERE VisitId = $1", &[&id.get()])
            .await
    }
}

#[async_trait]
impl StoreSession for PostgreSQLSession {
    fn mode(&self) -> SessionMode {
        self.mode
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finish("COMMIT").await
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let mut this = self;
        this.finish("ROLLBACK").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paid_flag_is_zero_or_one() {
        assert_eq!(paid_flag(true), 1);
        assert_eq!(paid_flag(false), 0);
    }

    #[test]
    fn test_schema_stores_paid_as_smallint() {
        let schema = include_str!("../../../migrations/postgresql/001_initial_schema.sql");
        assert!(schema.contains("Paid SMALLINT NOT NULL DEFAULT 0"));
    }
}
