use std::collections::BTreeMap;

use async_trait::async_trait;
use bson::{doc, oid::ObjectId};
use futures::stream::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use tracing::{debug, error, info, instrument};

use crate::config::mongo_conf::MongoConfig;
use crate::model::quote::QuoteRequest;
use crate::model::quote_stats::QuoteStats;
use crate::repository::quote_query::{
    reshape_counts, reshape_stats, stats_pipeline, status_histogram_pipeline, QuoteFilter,
    QuoteListParams,
};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Inserts a new record and returns it with its assigned id.
    async fn create(&self, quote: QuoteRequest) -> RepositoryResult<QuoteRequest>;
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRequest>;
    /// Overwrites the stored record; last write wins.
    async fn replace(&self, id: ObjectId, quote: QuoteRequest) -> RepositoryResult<QuoteRequest>;
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()>;
    async fn count(&self, filter: &QuoteFilter) -> RepositoryResult<u64>;
    async fn find_page(&self, params: &QuoteListParams) -> RepositoryResult<Vec<QuoteRequest>>;
    /// Number of records per status over the whole collection.
    async fn status_counts(&self) -> RepositoryResult<BTreeMap<String, u64>>;
    async fn stats(&self) -> RepositoryResult<QuoteStats>;
}

pub struct MongoQuoteRepository {
    collection: Collection<QuoteRequest>,
}

impl MongoQuoteRepository {
    pub const DEFAULT_COLLECTION: &'static str = "quote_requests";

    /// Connects using `MongoConfig` and binds the quote collection.
    pub async fn new(config: &MongoConfig) -> RepositoryResult<Self> {
        let db = connect(config).await?;
        let collection_name = config.quote_collection.as_deref().unwrap_or(Self::DEFAULT_COLLECTION);
        Ok(Self::with_database(&db, collection_name))
    }

    pub fn with_database(db: &Database, collection_name: &str) -> Self {
        MongoQuoteRepository { collection: db.collection::<QuoteRequest>(collection_name) }
    }

    /// Indexes backing the default sort and the status/priority filters.
    #[instrument(skip(self))]
    pub async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "createdAt": -1 })
                .options(IndexOptions::builder().name("createdAt_desc".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "status": 1, "createdAt": -1 })
                .options(IndexOptions::builder().name("status_createdAt".to_string()).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "priority": 1 })
                .options(IndexOptions::builder().name("priority".to_string()).build())
                .build(),
        ];
        self.collection.create_indexes(indexes, None).await?;
        info!("Quote request indexes ensured");
        Ok(())
    }
}

/// Builds a client from `MongoConfig` and returns the configured database.
pub async fn connect(config: &MongoConfig) -> RepositoryResult<Database> {
    use mongodb::{options::{ClientOptions, Credential, ResolverConfig}, Client};

    let mut client_options = ClientOptions::parse_with_resolver_config(&config.uri, ResolverConfig::cloudflare())
        .await
        .map_err(|e| RepositoryError::connection(format!("Invalid MongoDB URI: {}", e)))?;
    client_options.app_name = Some(config.app_name.clone());
    client_options.max_pool_size = Some(config.pool_size);
    client_options.connect_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));
    client_options.server_selection_timeout = Some(std::time::Duration::from_secs(config.connection_timeout_secs));

    if let (Some(username), Some(password)) = (&config.username, &config.password) {
        client_options.credential = Some(
            Credential::builder()
                .username(username.clone())
                .password(password.clone())
                .build(),
        );
    }

    let client = Client::with_options(client_options)?;
    info!(database = %config.database, "MongoDB client configured");
    Ok(client.database(&config.database))
}

#[async_trait]
impl QuoteRepository for MongoQuoteRepository {
    #[instrument(skip(self, quote), fields(email = %quote.email, project_type = %quote.project_type))]
    async fn create(&self, quote: QuoteRequest) -> RepositoryResult<QuoteRequest> {
        let mut new_quote = quote;
        new_quote.id = Some(ObjectId::new());
        match self.collection.insert_one(&new_quote, None).await {
            Ok(_) => {
                info!(id = ?new_quote.id, "Quote request created");
                Ok(new_quote)
            }
            Err(e) => {
                error!("Failed to create quote request: {}", e);
                Err(e.into())
            }
        }
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn get_by_id(&self, id: ObjectId) -> RepositoryResult<QuoteRequest> {
        match self.collection.find_one(doc! { "_id": id }, None).await? {
            Some(quote) => Ok(quote),
            None => {
                debug!("Quote request not found");
                Err(RepositoryError::not_found(format!("Quote request {} not found", id)))
            }
        }
    }

    #[instrument(skip(self, quote), fields(id = %id, status = %quote.status))]
    async fn replace(&self, id: ObjectId, quote: QuoteRequest) -> RepositoryResult<QuoteRequest> {
        let mut quote = quote;
        quote.id = Some(id);
        let result = self.collection.replace_one(doc! { "_id": id }, &quote, None).await?;
        if result.matched_count == 0 {
            error!("No quote request found to replace");
            return Err(RepositoryError::not_found(format!("Quote request {} not found", id)));
        }
        info!("Quote request updated");
        Ok(quote)
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn delete(&self, id: ObjectId) -> RepositoryResult<()> {
        let result = self.collection.delete_one(doc! { "_id": id }, None).await?;
        if result.deleted_count == 0 {
            error!("No quote request found to delete");
            return Err(RepositoryError::not_found(format!("Quote request {} not found", id)));
        }
        info!("Quote request deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn count(&self, filter: &QuoteFilter) -> RepositoryResult<u64> {
        let count = self.collection.count_documents(filter.to_document(), None).await?;
        debug!(count, "Counted quote requests");
        Ok(count)
    }

    #[instrument(skip(self), fields(page = params.page, limit = params.limit))]
    async fn find_page(&self, params: &QuoteListParams) -> RepositoryResult<Vec<QuoteRequest>> {
        let Some(skip) = params.skip() else {
            debug!("Page offset out of range, returning an empty page");
            return Ok(Vec::new());
        };
        let options = FindOptions::builder()
            .sort(params.sort.to_document())
            .skip(skip)
            .limit(i64::try_from(params.limit).unwrap_or(i64::MAX))
            .build();
        let cursor = self.collection.find(params.filter.to_document(), options).await?;
        let quotes: Vec<QuoteRequest> = cursor.try_collect().await?;
        debug!(fetched = quotes.len(), "Fetched quote request page");
        Ok(quotes)
    }

    #[instrument(skip(self))]
    async fn status_counts(&self) -> RepositoryResult<BTreeMap<String, u64>> {
        let cursor = self.collection.aggregate(status_histogram_pipeline(), None).await?;
        let groups: Vec<bson::Document> = cursor.try_collect().await?;
        Ok(reshape_counts(&groups))
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> RepositoryResult<QuoteStats> {
        let mut cursor = self.collection.aggregate(stats_pipeline(), None).await?;
        match cursor.try_next().await? {
            Some(result) => reshape_stats(&result),
            None => Ok(QuoteStats::default()),
        }
    }
}
