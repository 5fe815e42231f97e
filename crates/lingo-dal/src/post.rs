use std::collections::{BTreeMap, HashMap, HashSet};

use garde::Validate;
use lingo_macros::Translation;
use lingo_types::language::{LanguageCode, SUPPORTED_LANGUAGE_COUNT};
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, Executor, Pool, Row};
use time::PrimitiveDateTime;
use tracing::debug;

use crate::{
    error::{Error, Result},
    translation::{self, Translated},
    Batch, ChosenDB, ChosenRow, ListingParams,
};

const VALID_ORDER_FIELDS: &[&str] = &["id", "created_at", "updated_at"];
const DEFAULT_ORDER: &str = "created_at, id";
const TITLE_MAX_LENGTH: usize = 255;
const DESCRIPTION_MAX_LENGTH: usize = 5000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Translation)]
#[serde(rename_all = "camelCase")]
pub struct PostTranslation {
    pub id: i64,
    pub post_id: i64,
    #[spec(language_code)]
    pub language_code: LanguageCode,
    #[translate]
    pub title: String,
    #[translate]
    pub description: String,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
}

fn decode_language(row: &ChosenRow) -> Result<LanguageCode, sqlx::Error> {
    let code: String = row.try_get("language_code")?;
    code.parse().map_err(|e| sqlx::Error::ColumnDecode {
        index: "language_code".to_string(),
        source: Box::new(e),
    })
}

impl sqlx::FromRow<'_, ChosenRow> for PostTranslation {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        Ok(PostTranslation {
            id: row.try_get("id")?,
            post_id: row.try_get("post_id")?,
            language_code: decode_language(row)?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    pub translations: Option<Vec<PostTranslation>>,
}

impl sqlx::FromRow<'_, ChosenRow> for Post {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        Ok(Post {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            translations: None,
        })
    }
}

impl Translated for Post {
    type Translation = PostTranslation;

    fn translations(&self) -> Option<&[PostTranslation]> {
        self.translations.as_deref()
    }
}

/// Post as seen in one language. Translated fields are absent when the post
/// has no translation in the requested language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDto {
    pub id: i64,
    pub user_id: i64,
    pub created_at: PrimitiveDateTime,
    pub updated_at: PrimitiveDateTime,
    #[serde(flatten)]
    pub translation: Option<PostTranslationFields>,
}

impl PostDto {
    pub fn project(post: &Post, language: Option<LanguageCode>) -> Self {
        PostDto {
            id: post.id,
            user_id: post.user_id,
            created_at: post.created_at,
            updated_at: post.updated_at,
            translation: translation::translated_fields(post, language),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationText {
    pub language_code: LanguageCode,
    pub text: String,
}

fn check_translations(values: &[TranslationText], max_length: usize) -> garde::Result {
    if values.is_empty() || values.len() > SUPPORTED_LANGUAGE_COUNT {
        return Err(garde::Error::new(format!(
            "expected 1 to {SUPPORTED_LANGUAGE_COUNT} translations"
        )));
    }
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value.language_code) {
            return Err(garde::Error::new(format!(
                "duplicate translation for {}",
                value.language_code
            )));
        }
        let length = value.text.chars().count();
        if length == 0 || length > max_length {
            return Err(garde::Error::new(format!(
                "text for {} must have 1 to {max_length} characters",
                value.language_code
            )));
        }
    }
    Ok(())
}

fn valid_titles(values: &Vec<TranslationText>, _ctx: &()) -> garde::Result {
    check_translations(values, TITLE_MAX_LENGTH)
}

fn valid_descriptions(values: &Vec<TranslationText>, _ctx: &()) -> garde::Result {
    check_translations(values, DESCRIPTION_MAX_LENGTH)
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePost {
    #[garde(custom(valid_titles))]
    pub title: Vec<TranslationText>,
    #[garde(custom(valid_descriptions))]
    pub description: Vec<TranslationText>,
}

/// Per language upsert, omitted languages stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePost {
    #[garde(inner(custom(valid_titles)))]
    pub title: Option<Vec<TranslationText>>,
    #[garde(inner(custom(valid_descriptions)))]
    pub description: Option<Vec<TranslationText>>,
}

struct NewTranslation {
    language_code: LanguageCode,
    title: String,
    description: String,
}

/// Pairs titles with descriptions of the same language. Duplicate titles are
/// kept so that storage rejects them.
fn pair_translations(payload: CreatePost) -> Result<Vec<NewTranslation>> {
    let CreatePost { title, description } = payload;
    if let Some(orphan) = description
        .iter()
        .find(|d| !title.iter().any(|t| t.language_code == d.language_code))
    {
        return Err(Error::IncompleteTranslation(orphan.language_code));
    }
    title
        .into_iter()
        .map(|t| {
            let description = description
                .iter()
                .find(|d| d.language_code == t.language_code)
                .map(|d| d.text.clone())
                .ok_or(Error::IncompleteTranslation(t.language_code))?;
            Ok(NewTranslation {
                language_code: t.language_code,
                title: t.text,
                description,
            })
        })
        .collect()
}

type TranslationChanges = BTreeMap<LanguageCode, (Option<String>, Option<String>)>;

fn merge_changes(payload: UpdatePost) -> TranslationChanges {
    let mut changes = TranslationChanges::new();
    for t in payload.title.into_iter().flatten() {
        changes.entry(t.language_code).or_default().0 = Some(t.text);
    }
    for d in payload.description.into_iter().flatten() {
        changes.entry(d.language_code).or_default().1 = Some(d.text);
    }
    changes
}

async fn insert_translation<'e, X>(executor: X, post_id: i64, t: &NewTranslation) -> Result<()>
where
    X: Executor<'e, Database = ChosenDB>,
{
    sqlx::query(
        "INSERT INTO post_translations (post_id, language_code, title, description) VALUES (?, ?, ?, ?)",
    )
    .bind(post_id)
    .bind(t.language_code.as_str())
    .bind(&t.title)
    .bind(&t.description)
    .execute(executor)
    .await?;
    Ok(())
}

async fn fetch_post<'e, X>(executor: X, id: i64) -> Result<Post>
where
    X: Executor<'e, Database = ChosenDB>,
{
    sqlx::query_as::<_, Post>("SELECT id, user_id, created_at, updated_at FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| Error::RecordNotFound("Post".to_string()))
}

async fn fetch_translations<'e, X>(executor: X, post_ids: &[i64]) -> Result<Vec<PostTranslation>>
where
    X: Executor<'e, Database = ChosenDB>,
{
    if post_ids.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; post_ids.len()].join(",");
    let sql = format!(
        "SELECT id, post_id, language_code, title, description, created_at, updated_at \
         FROM post_translations WHERE post_id IN ({placeholders}) ORDER BY post_id, language_code"
    );
    let mut query = sqlx::query_as::<_, PostTranslation>(&sql);
    for id in post_ids {
        query = query.bind(*id);
    }
    let records = query.fetch_all(executor).await?;
    Ok(records)
}

fn attach_translations(posts: &mut [Post], translations: Vec<PostTranslation>) {
    let mut by_post: HashMap<i64, Vec<PostTranslation>> = HashMap::new();
    for t in translations {
        by_post.entry(t.post_id).or_default().push(t);
    }
    for post in posts {
        post.translations = Some(by_post.remove(&post.id).unwrap_or_default());
    }
}

pub type PostRepository = PostRepositoryImpl<Pool<ChosenDB>>;

pub struct PostRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> PostRepositoryImpl<E>
where
    for<'a> &'a E: Executor<'c, Database = ChosenDB> + Acquire<'c, Database = ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Creates the post with all its translations or nothing at all.
    pub async fn create(&self, user_id: i64, payload: CreatePost) -> Result<Post> {
        let translations = pair_translations(payload)?;
        let mut tx = self.executor.begin().await?;

        let post_id = sqlx::query("INSERT INTO posts (user_id) VALUES (?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for t in &translations {
            insert_translation(&mut *tx, post_id, t).await?;
        }

        let mut post = fetch_post(&mut *tx, post_id).await?;
        let translations = fetch_translations(&mut *tx, &[post_id]).await?;
        tx.commit().await?;

        attach_translations(std::slice::from_mut(&mut post), translations);
        debug!("Created post {post_id} for user {user_id}");
        Ok(post)
    }

    pub async fn get(&self, id: i64) -> Result<Post> {
        let mut post = fetch_post(&self.executor, id).await?;
        let translations = fetch_translations(&self.executor, &[id]).await?;
        attach_translations(std::slice::from_mut(&mut post), translations);
        Ok(post)
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<Post>> {
        self.list_filtered(None, params).await
    }

    pub async fn list_by_user(&self, user_id: i64, params: ListingParams) -> Result<Batch<Post>> {
        self.list_filtered(Some(user_id), params).await
    }

    async fn list_filtered(&self, user_id: Option<i64>, params: ListingParams) -> Result<Batch<Post>> {
        let order = match params.ordering(VALID_ORDER_FIELDS)? {
            o if o.is_empty() => DEFAULT_ORDER.to_string(),
            o => o,
        };
        let pattern = params.like_pattern();

        let mut conditions = Vec::new();
        if user_id.is_some() {
            conditions.push("user_id = ?");
        }
        if pattern.is_some() {
            conditions.push(
                "EXISTS (SELECT 1 FROM post_translations t WHERE t.post_id = posts.id AND t.title LIKE ? ESCAPE '\\')",
            );
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT count(*) FROM posts {where_clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        if let Some(user_id) = user_id {
            count_query = count_query.bind(user_id);
        }
        if let Some(pattern) = &pattern {
            count_query = count_query.bind(pattern.as_str());
        }
        let total = count_query.fetch_one(&self.executor).await?;

        let sql = format!(
            "SELECT id, user_id, created_at, updated_at FROM posts {where_clause} ORDER BY {order} LIMIT ? OFFSET ?"
        );
        let mut query = sqlx::query_as::<_, Post>(&sql);
        if let Some(user_id) = user_id {
            query = query.bind(user_id);
        }
        if let Some(pattern) = &pattern {
            query = query.bind(pattern.as_str());
        }
        let mut rows = query
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.executor)
            .await?;

        let ids = rows.iter().map(|p| p.id).collect::<Vec<_>>();
        let translations = fetch_translations(&self.executor, &ids).await?;
        attach_translations(&mut rows, translations);

        Ok(Batch {
            offset: params.offset,
            limit: params.limit,
            total: total.try_into().unwrap_or_default(),
            rows,
        })
    }

    /// Upserts translations by language inside one transaction. A language
    /// the post does not have yet needs both title and description.
    pub async fn update(&self, id: i64, payload: UpdatePost) -> Result<Post> {
        let changes = merge_changes(payload);
        let mut tx = self.executor.begin().await?;

        fetch_post(&mut *tx, id).await?;

        for (language_code, (title, description)) in changes {
            let result = sqlx::query(
                "UPDATE post_translations SET title = COALESCE(?, title), description = COALESCE(?, description), \
                 updated_at = datetime('now') WHERE post_id = ? AND language_code = ?",
            )
            .bind(title.as_deref())
            .bind(description.as_deref())
            .bind(id)
            .bind(language_code.as_str())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                match (title, description) {
                    (Some(title), Some(description)) => {
                        let t = NewTranslation {
                            language_code,
                            title,
                            description,
                        };
                        insert_translation(&mut *tx, id, &t).await?;
                    }
                    _ => return Err(Error::IncompleteTranslation(language_code)),
                }
            }
        }

        sqlx::query("UPDATE posts SET updated_at = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let mut post = fetch_post(&mut *tx, id).await?;
        let translations = fetch_translations(&mut *tx, &[id]).await?;
        tx.commit().await?;

        attach_translations(std::slice::from_mut(&mut post), translations);
        Ok(post)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Post".to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use lingo_types::language::LanguageCode::{EnUs, RuRu};
    use time::macros::datetime;

    use super::*;
    use crate::translation::Translation as _;

    fn text(language_code: LanguageCode, text: &str) -> TranslationText {
        TranslationText {
            language_code,
            text: text.to_string(),
        }
    }

    fn translation(id: i64, language_code: LanguageCode, title: &str) -> PostTranslation {
        PostTranslation {
            id,
            post_id: 1,
            language_code,
            title: title.to_string(),
            description: format!("{title} description"),
            created_at: datetime!(2024-01-01 10:00),
            updated_at: datetime!(2024-01-01 10:00),
        }
    }

    fn post(translations: Option<Vec<PostTranslation>>) -> Post {
        Post {
            id: 1,
            user_id: 5,
            created_at: datetime!(2024-01-01 10:00),
            updated_at: datetime!(2024-01-02 10:00),
            translations,
        }
    }

    #[test]
    fn test_allow_list() {
        assert_eq!(PostTranslation::TRANSLATABLE_FIELDS, &["title", "description"]);
    }

    #[test]
    fn test_project_matching_language() {
        let post = post(Some(vec![
            translation(1, EnUs, "Hello"),
            translation(2, RuRu, "Привет"),
        ]));
        let dto = PostDto::project(&post, Some(RuRu));
        let fields = dto.translation.unwrap();
        assert_eq!(fields.title, "Привет");
        assert_eq!(fields.description, "Привет description");
        assert_eq!(dto.id, 1);
        assert_eq!(dto.user_id, 5);
    }

    #[test]
    fn test_project_missing_language() {
        let post = post(Some(vec![translation(1, EnUs, "Hello")]));
        let dto = PostDto::project(&post, Some(RuRu));
        assert!(dto.translation.is_none());
        assert_eq!(dto.created_at, post.created_at);
        assert_eq!(dto.updated_at, post.updated_at);

        let json = serde_json::to_value(&dto).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("id"));
        assert!(obj.contains_key("createdAt"));
        assert!(obj.contains_key("updatedAt"));
        assert!(!obj.contains_key("title"));
        assert!(!obj.contains_key("description"));
    }

    #[test]
    fn test_project_without_language() {
        let post = post(Some(vec![translation(1, EnUs, "Hello")]));
        assert!(PostDto::project(&post, None).translation.is_none());
    }

    #[test]
    fn test_project_no_translations() {
        assert!(PostDto::project(&post(Some(vec![])), Some(EnUs)).translation.is_none());
        assert!(PostDto::project(&post(None), Some(EnUs)).translation.is_none());
    }

    #[test]
    fn test_project_idempotent() {
        let post = post(Some(vec![translation(1, EnUs, "Hello")]));
        assert_eq!(PostDto::project(&post, Some(EnUs)), PostDto::project(&post, Some(EnUs)));
    }

    #[test]
    fn test_flattened_json() {
        let post = post(Some(vec![translation(1, EnUs, "Hello")]));
        let json = serde_json::to_value(PostDto::project(&post, Some(EnUs))).unwrap();
        assert_eq!(json["title"], "Hello");
        assert_eq!(json["description"], "Hello description");
        assert_eq!(json["userId"], 5);
    }

    #[test]
    fn test_validate_create() {
        let valid = CreatePost {
            title: vec![text(EnUs, "Title"), text(RuRu, "Заголовок")],
            description: vec![text(EnUs, "Body"), text(RuRu, "Текст")],
        };
        assert!(valid.validate().is_ok());

        let duplicate = CreatePost {
            title: vec![text(EnUs, "Title"), text(EnUs, "Other")],
            description: vec![text(EnUs, "Body")],
        };
        assert!(duplicate.validate().is_err());

        let empty = CreatePost {
            title: vec![],
            description: vec![],
        };
        assert!(empty.validate().is_err());

        let blank = CreatePost {
            title: vec![text(EnUs, "")],
            description: vec![text(EnUs, "Body")],
        };
        assert!(blank.validate().is_err());

        let long = CreatePost {
            title: vec![text(EnUs, &"x".repeat(TITLE_MAX_LENGTH + 1))],
            description: vec![text(EnUs, "Body")],
        };
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_validate_update() {
        assert!(UpdatePost::default().validate().is_ok());
        let update = UpdatePost {
            title: Some(vec![text(RuRu, "a"), text(RuRu, "b")]),
            description: None,
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_pair_translations() {
        let paired = pair_translations(CreatePost {
            title: vec![text(EnUs, "T"), text(RuRu, "Т")],
            description: vec![text(RuRu, "Д"), text(EnUs, "D")],
        })
        .unwrap();
        assert_eq!(paired.len(), 2);
        assert_eq!(paired[0].language_code, EnUs);
        assert_eq!(paired[0].description, "D");
        assert_eq!(paired[1].description, "Д");

        let missing = pair_translations(CreatePost {
            title: vec![text(EnUs, "T"), text(RuRu, "Т")],
            description: vec![text(EnUs, "D")],
        });
        assert!(matches!(missing, Err(Error::IncompleteTranslation(RuRu))));

        let orphan = pair_translations(CreatePost {
            title: vec![text(EnUs, "T")],
            description: vec![text(EnUs, "D"), text(RuRu, "Д")],
        });
        assert!(matches!(orphan, Err(Error::IncompleteTranslation(RuRu))));
    }

    #[test]
    fn test_merge_changes() {
        let changes = merge_changes(UpdatePost {
            title: Some(vec![text(EnUs, "T")]),
            description: Some(vec![text(EnUs, "D"), text(RuRu, "Д")]),
        });
        assert_eq!(
            changes.get(&EnUs),
            Some(&(Some("T".to_string()), Some("D".to_string())))
        );
        assert_eq!(changes.get(&RuRu), Some(&(None, Some("Д".to_string()))));
    }
}
