//! MongoSink - unordered bulk insert of each batch

use config_loader::MongoCredentials;
use contracts::{Batch, ContractError, RecordSink, SendReport, TelemetryRecord};
use mongodb::error::ErrorKind;
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Collection};
use tracing::{info, instrument, warn};

/// Open a client using separately supplied credentials
///
/// The connection string carries no user info; the password never appears
/// in a URI or a log line.
#[instrument(name = "mongo_client_connect", skip(credentials), fields(host = %credentials.host))]
pub async fn mongo_client(
    credentials: &MongoCredentials,
    app_name: &str,
) -> mongodb::error::Result<Client> {
    let mut options = ClientOptions::parse(credentials.connection_uri()).await?;

    let mut credential = options.credential.take().unwrap_or_else(Credential::default);
    credential.username = Some(credentials.user.clone());
    credential.password = Some(credentials.password.clone());
    options.credential = Some(credential);
    options.app_name = Some(app_name.to_string());

    Client::with_options(options)
}

/// Document store sink
pub struct MongoSink {
    name: String,
    collection: Collection<TelemetryRecord>,
    inserted: u64,
}

impl MongoSink {
    /// Connect and bind to `collection` in the credentials' database
    pub async fn connect(
        name: String,
        credentials: &MongoCredentials,
        collection: &str,
    ) -> Result<Self, ContractError> {
        let client = mongo_client(credentials, &name)
            .await
            .map_err(|e| ContractError::sink_connection(&name, e.to_string()))?;

        info!(
            sink = %name,
            database = %credentials.database,
            collection,
            "MongoSink ready"
        );

        Ok(Self::from_collection(
            name,
            client
                .database(&credentials.database)
                .collection::<TelemetryRecord>(collection),
        ))
    }

    pub fn from_collection(name: String, collection: Collection<TelemetryRecord>) -> Self {
        Self {
            name,
            collection,
            inserted: 0,
        }
    }
}

impl RecordSink for MongoSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "mongo_sink_send",
        skip(self, batch),
        fields(sink = %self.name, batch = batch.sequence, records = batch.len())
    )]
    async fn send(&mut self, batch: &Batch) -> Result<SendReport, ContractError> {
        if batch.is_empty() {
            return Ok(SendReport::accepted(0));
        }

        let report = match self
            .collection
            .insert_many(&batch.records)
            .ordered(false)
            .await
        {
            Ok(result) => SendReport {
                acknowledged: true,
                inserted: result.inserted_ids.len(),
            },
            Err(e) => match e.kind.as_ref() {
                ErrorKind::InsertMany(failure) => {
                    let failed = failure.write_errors.as_ref().map_or(0, Vec::len);
                    let report = partial_insert_report(
                        batch.len(),
                        failed,
                        failure.write_concern_error.is_none(),
                    );
                    warn!(
                        sink = %self.name,
                        failed_documents = failed,
                        inserted = report.inserted,
                        write_concern_error = failure.write_concern_error.is_some(),
                        "Bulk insert partially failed"
                    );
                    report
                }
                _ => return Err(ContractError::sink_write(&self.name, e.to_string())),
            },
        };

        self.inserted += report.inserted as u64;
        Ok(report)
    }

    #[instrument(name = "mongo_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, inserted = self.inserted, "MongoSink closed");
        Ok(())
    }
}

/// Report for an unordered insert where some documents were rejected
///
/// Every document not named by a write error was inserted.
pub fn partial_insert_report(
    attempted: usize,
    failed_documents: usize,
    write_concern_satisfied: bool,
) -> SendReport {
    SendReport {
        acknowledged: write_concern_satisfied,
        inserted: attempted.saturating_sub(failed_documents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_insert_counts_survivors() {
        let report = partial_insert_report(100, 3, true);
        assert!(report.acknowledged);
        assert_eq!(report.inserted, 97);
    }

    #[test]
    fn test_write_concern_failure_not_acknowledged() {
        let report = partial_insert_report(10, 0, false);
        assert!(!report.acknowledged);
        assert_eq!(report.inserted, 10);
    }

    #[test]
    fn test_more_errors_than_documents_saturates() {
        assert_eq!(partial_insert_report(2, 5, true).inserted, 0);
    }

    #[test]
    fn test_connection_uri_has_no_credentials() {
        let credentials = MongoCredentials {
            scheme: "mongodb+srv".into(),
            host: "cluster0.example.net".into(),
            user: "loader".into(),
            password: "s3cret".into(),
            database: "agri".into(),
        };
        let uri = credentials.connection_uri();
        assert_eq!(uri, "mongodb+srv://cluster0.example.net/agri");
        assert!(!uri.contains("s3cret"));
        assert!(!format!("{credentials:?}").contains("s3cret"));
    }
}
