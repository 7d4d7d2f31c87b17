//! Postgres-backed document store.
//!
//! Each collection is one table holding JSONB documents:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS inventory (
//!     seq BIGSERIAL PRIMARY KEY,
//!     doc JSONB NOT NULL
//! );
//! ```
//!
//! Filters and pipelines are translated into parameterised SQL. Field names
//! and values are always bound; only the validated collection name is
//! spliced into the statement text.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database | `Query` |
//! | PoolTimedOut, PoolClosed, Io, Tls, Protocol | `Connection` |
//! | ColumnDecode, Decode | `Serialization` |
//! | Other | `Query` |

use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{Span, instrument};

use aggreports_core::{DocumentKey, KEY_FIELD, WireDocument};
use aggreports_query::{Condition, Filter, GROUP_KEY, GroupStage, Literal, Pipeline, Range, Stage};

use super::{CallOptions, DocumentStore, StoreError, validate_collection};

/// JSONB document store over a Postgres connection pool.
///
/// `PgPool` is internally reference counted, so clones share connections.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the backing table of every named collection if missing.
    #[instrument(skip(self), err)]
    pub async fn ensure_collections(&self, collections: &[&str]) -> Result<(), StoreError> {
        for collection in collections {
            let table = validate_collection(collection)?;
            let ddl = format!(
                r#"CREATE TABLE IF NOT EXISTS "{table}" (seq BIGSERIAL PRIMARY KEY, doc JSONB NOT NULL)"#
            );
            sqlx::query(&ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_collections", e))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(
        skip(self, filter, options),
        fields(clauses = filter.len(), document_count = tracing::field::Empty),
        err
    )]
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError> {
        let mut query = find_query(validate_collection(collection)?, filter);
        let docs = options
            .run("find", async {
                query
                    .build_query_scalar::<Json<WireDocument>>()
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("find", e))
            })
            .await?;

        Span::current().record("document_count", docs.len());
        Ok(docs.into_iter().map(|Json(doc)| doc).collect())
    }

    #[instrument(skip(self, pipeline, options), fields(stages = pipeline.stages().len()), err)]
    async fn aggregate(
        &self,
        collection: &str,
        pipeline: &Pipeline,
        options: &CallOptions,
    ) -> Result<Vec<WireDocument>, StoreError> {
        let mut query = aggregate_query(validate_collection(collection)?, pipeline)?;
        let docs = options
            .run("aggregate", async {
                query
                    .build_query_scalar::<Json<WireDocument>>()
                    .fetch_all(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("aggregate", e))
            })
            .await?;
        Ok(docs.into_iter().map(|Json(doc)| doc).collect())
    }

    #[instrument(skip(self, documents, options), fields(document_count = documents.len()), err)]
    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<WireDocument>,
        options: &CallOptions,
    ) -> Result<Vec<DocumentKey>, StoreError> {
        let table = validate_collection(collection)?;
        if documents.is_empty() {
            return Ok(vec![]);
        }

        let (keys, documents) = assign_keys(documents)?;
        let mut query = insert_query(table, documents);
        options
            .run("insert_many", async {
                query
                    .build()
                    .execute(&self.pool)
                    .await
                    .map_err(|e| map_sqlx_error("insert_many", e))
            })
            .await?;
        Ok(keys)
    }
}

fn assign_keys(
    documents: Vec<WireDocument>,
) -> Result<(Vec<DocumentKey>, Vec<WireDocument>), StoreError> {
    let mut keys = Vec::with_capacity(documents.len());
    let mut keyed = Vec::with_capacity(documents.len());
    for mut doc in documents {
        let key = match doc.get(KEY_FIELD) {
            Some(serde_json::Value::String(key)) => DocumentKey::new(key.clone()),
            Some(serde_json::Value::Null) | None => {
                let key = DocumentKey::generate();
                doc.insert(KEY_FIELD.to_string(), key.to_string().into());
                key
            }
            Some(other) => {
                return Err(StoreError::Serialization(format!(
                    "insert_many: unsupported {KEY_FIELD} value {other}"
                )));
            }
        };
        keys.push(key);
        keyed.push(doc);
    }
    Ok((keys, keyed))
}

fn find_query(table: &str, filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(r#"SELECT doc FROM "{table}" WHERE "#));
    push_filter(&mut query, filter);
    query.push(" ORDER BY seq");
    query
}

fn aggregate_query(
    table: &str,
    pipeline: &Pipeline,
) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
    match pipeline.stages() {
        [] => Ok(find_query(table, &Filter::new())),
        [Stage::Group(group)] => Ok(group_query(table, group)),
        _ => Err(StoreError::Query(format!(
            "aggregate: unsupported pipeline {pipeline}"
        ))),
    }
}

/// `$group` with `$sum`s as a grouped subquery folded back into JSONB.
fn group_query(table: &str, group: &GroupStage) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new("SELECT jsonb_build_object(");
    query.push_bind(GROUP_KEY.to_string());
    query.push("::text, g.key");
    for (i, sum) in group.sums.iter().enumerate() {
        query.push(", ");
        query.push_bind(sum.output.clone());
        query.push(format!("::text, g.s{i}"));
    }
    query.push(") AS doc FROM (SELECT doc -> ");
    query.push_bind(group.key.clone());
    query.push(" AS key, MIN(seq) AS first_seq");
    for (i, sum) in group.sums.iter().enumerate() {
        query.push(", COALESCE(SUM(");
        push_float(&mut query, &sum.source);
        query.push(format!("), 0) AS s{i}"));
    }
    query.push(format!(r#" FROM "{table}" GROUP BY 1) g ORDER BY g.first_seq"#));
    query
}

fn insert_query(table: &str, documents: Vec<WireDocument>) -> QueryBuilder<'static, Postgres> {
    let mut query = QueryBuilder::new(format!(r#"INSERT INTO "{table}" (doc) "#));
    query.push_values(documents, |mut row, doc| {
        row.push_bind(Json(doc));
    });
    query
}

fn push_filter(query: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    if filter.is_empty() {
        query.push("TRUE");
        return;
    }
    for (i, clause) in filter.clauses().iter().enumerate() {
        if i > 0 {
            query.push(" AND ");
        }
        push_condition(query, &clause.field, &clause.condition);
    }
}

fn push_condition(query: &mut QueryBuilder<'static, Postgres>, field: &str, condition: &Condition) {
    match condition {
        Condition::Eq(literal) => push_eq(query, field, literal),
        Condition::In(literals) if literals.is_empty() => {
            query.push("FALSE");
        }
        Condition::In(literals) => {
            query.push("(");
            for (i, literal) in literals.iter().enumerate() {
                if i > 0 {
                    query.push(" OR ");
                }
                push_eq(query, field, literal);
            }
            query.push(")");
        }
        Condition::Range(range) => push_range(query, field, range),
    }
}

fn push_eq(query: &mut QueryBuilder<'static, Postgres>, field: &str, literal: &Literal) {
    query.push("(");
    match literal {
        Literal::Text(text) => {
            query.push("doc -> ");
            query.push_bind(field.to_string());
            query.push(" = to_jsonb(");
            query.push_bind(text.clone());
            query.push("::text)");
        }
        Literal::Float(value) => {
            push_float(query, field);
            query.push(" = ");
            query.push_bind(*value);
        }
        Literal::Int(value) => {
            push_numeric(query, field);
            query.push(" = ");
            query.push_bind(*value);
        }
    }
    query.push(")");
}

fn push_range(query: &mut QueryBuilder<'static, Postgres>, field: &str, range: &Range) {
    let bounds: Vec<(&str, &Literal)> = [(">", range.gt.as_ref()), ("<", range.lt.as_ref())]
        .into_iter()
        .filter_map(|(op, lit)| lit.map(|lit| (op, lit)))
        .collect();
    if bounds.is_empty() {
        query.push("TRUE");
        return;
    }

    query.push("(");
    for (i, (op, literal)) in bounds.into_iter().enumerate() {
        if i > 0 {
            query.push(" AND ");
        }
        match literal {
            Literal::Text(text) => {
                push_text(query, field);
                query.push(format!(" {op} "));
                query.push_bind(text.clone());
            }
            Literal::Float(value) => {
                push_float(query, field);
                query.push(format!(" {op} "));
                query.push_bind(*value);
            }
            Literal::Int(value) => {
                push_numeric(query, field);
                query.push(format!(" {op} "));
                query.push_bind(*value);
            }
        }
    }
    query.push(")");
}

/// `doc -> field` as float8 when it is a JSON number, otherwise NULL.
fn push_float(query: &mut QueryBuilder<'static, Postgres>, field: &str) {
    push_typed(query, field, "number", "float8");
}

fn push_numeric(query: &mut QueryBuilder<'static, Postgres>, field: &str) {
    push_typed(query, field, "number", "numeric");
}

fn push_text(query: &mut QueryBuilder<'static, Postgres>, field: &str) {
    push_typed(query, field, "string", "text");
}

fn push_typed(query: &mut QueryBuilder<'static, Postgres>, field: &str, json_type: &str, sql_type: &str) {
    query.push("(CASE WHEN jsonb_typeof(doc -> ");
    query.push_bind(field.to_string());
    query.push(format!(") = '{json_type}' THEN (doc ->> "));
    query.push_bind(field.to_string());
    query.push(format!(")::{sql_type} END)"));
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let code = db_err.code().map(|c| c.to_string()).unwrap_or_default();
            StoreError::Query(format!(
                "database error in {operation} ({code}): {}",
                db_err.message()
            ))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connection(format!("connection pool unavailable in {operation}: {err}"))
        }
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Protocol(_) => {
            StoreError::Connection(format!("connection error in {operation}: {err}"))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Serialization(format!("failed to decode document in {operation}: {err}"))
        }
        _ => StoreError::Query(format!("sqlx error in {operation}: {err}")),
    }
}
