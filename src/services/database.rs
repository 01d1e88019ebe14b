//! Document store on top of RocksDB.
//!
//! Every entity is stored as a JSON document keyed by its UUID. Secondary
//! indexes live in their own column families so that aggregations and
//! uniqueness checks never need to decode full documents.
//!
//! # Data Organization
//!
//! - `toilets`: Toilet documents (key: UUID)
//! - `comments`: Comment documents (key: UUID)
//! - `ratings`: Rating documents (key: UUID)
//! - `toilet_ratings`: `toilet:rating` -> rating value (single byte)
//! - `user_ratings`: `user:toilet` -> rating UUID (one rating per user and toilet)
//! - `users`: User documents (key: UUID)
//! - `user_emails`: normalized email -> user UUID
//! - `images`: Image metadata documents (key: UUID)
//!
//! RocksDB offers no read-modify-write transactions on a plain DB, so every
//! mutation that reads a toilet document before rewriting it runs under
//! `write_lock`. The lock guards synchronous code only and is never held
//! across an `.await`.

use crate::config::StorageConfig;
use crate::error::{AppError, Result};
use crate::models::{
    normalize_email, Comment, GeoPoint, ImageMeta, Rating, RatingSummary, RatingValue, Toilet,
    User,
};
use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

type DB = DBWithThreadMode<MultiThreaded>;

/// Column family names
const CF_TOILETS: &str = "toilets";
const CF_COMMENTS: &str = "comments";
const CF_RATINGS: &str = "ratings";
const CF_TOILET_RATINGS: &str = "toilet_ratings";
const CF_USER_RATINGS: &str = "user_ratings";
const CF_USERS: &str = "users";
const CF_USER_EMAILS: &str = "user_emails";
const CF_IMAGES: &str = "images";

const COLUMN_FAMILIES: [&str; 8] = [
    CF_TOILETS,
    CF_COMMENTS,
    CF_RATINGS,
    CF_TOILET_RATINGS,
    CF_USER_RATINGS,
    CF_USERS,
    CF_USER_EMAILS,
    CF_IMAGES,
];

/// Database service holding all documents
pub struct DatabaseService {
    db: Arc<DB>,
    db_path: PathBuf,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("path", &self.db_path)
            .finish()
    }
}

/// Entity counts for the stats endpoints
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct DatabaseStats {
    pub toilets: u64,
    pub comments: u64,
    pub ratings: u64,
    pub users: u64,
    pub images: u64,
}

impl DatabaseService {
    /// Open (or create) the database below `data_dir/rocksdb`
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let db_path = config.database_path();
        std::fs::create_dir_all(&db_path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        // Performance tuning
        opts.set_max_open_files(256);
        opts.set_keep_log_file_num(3);
        opts.set_max_total_wal_size(64 * 1024 * 1024); // 64MB
        opts.set_write_buffer_size(32 * 1024 * 1024); // 32MB
        opts.set_max_write_buffer_number(3);

        let cf_descriptors: Vec<_> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &db_path, cf_descriptors)
            .map_err(|e| AppError::internal(format!("Failed to open RocksDB: {}", e)))?;

        info!(path = %db_path.display(), "Database initialized (RocksDB)");

        Ok(Self {
            db: Arc::new(db),
            db_path,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| AppError::internal(format!("Column family {} is missing", name)))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| AppError::internal("Database write lock poisoned"))
    }

    fn get_doc<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(data) => Ok(Some(serde_json::from_slice(&data)?)),
            None => Ok(None),
        }
    }

    fn put_doc<T: Serialize>(
        &self,
        batch: &mut WriteBatch,
        cf_name: &str,
        key: &str,
        doc: &T,
    ) -> Result<()> {
        let data = serde_json::to_vec(doc)?;
        batch.put_cf(&self.cf(cf_name)?, key.as_bytes(), data);
        Ok(())
    }

    fn delete_key(&self, batch: &mut WriteBatch, cf_name: &str, key: &str) -> Result<()> {
        batch.delete_cf(&self.cf(cf_name)?, key.as_bytes());
        Ok(())
    }

    fn scan_docs<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut docs = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            docs.push(serde_json::from_slice(&value)?);
        }
        Ok(docs)
    }

    /// Collect `(key, value)` pairs whose key starts with `prefix`
    fn scan_prefix(&self, cf_name: &str, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let mut entries = Vec::new();
        let iter = self.db.iterator_cf(
            &cf,
            IteratorMode::From(prefix.as_bytes(), Direction::Forward),
        );

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            entries.push((String::from_utf8_lossy(&key).into_owned(), value.to_vec()));
        }
        Ok(entries)
    }

    fn count(&self, cf_name: &str) -> Result<u64> {
        let cf = self.cf(cf_name)?;
        let mut count = 0u64;
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch)?;
        Ok(())
    }

    fn require_toilet(&self, id: Uuid) -> Result<Toilet> {
        self.get_toilet(id)?.ok_or(AppError::ToiletNotFound(id))
    }

    // =========================================================================
    // Toilet operations
    // =========================================================================

    pub fn insert_toilet(&self, toilet: &Toilet) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_TOILETS, &toilet.id.to_string(), toilet)?;
        self.write(batch)?;

        debug!(id = %toilet.id, "Inserted toilet");
        Ok(())
    }

    pub fn get_toilet(&self, id: Uuid) -> Result<Option<Toilet>> {
        self.get_doc(CF_TOILETS, &id.to_string())
    }

    /// Read a toilet, let `f` mutate it and write it back atomically
    /// with respect to other toilet mutations.
    pub fn update_toilet<F>(&self, id: Uuid, f: F) -> Result<Toilet>
    where
        F: FnOnce(&mut Toilet) -> Result<()>,
    {
        let _guard = self.lock()?;
        let mut toilet = self.require_toilet(id)?;
        f(&mut toilet)?;

        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_TOILETS, &id.to_string(), &toilet)?;
        self.write(batch)?;

        debug!(id = %id, "Updated toilet");
        Ok(toilet)
    }

    /// All toilets, newest first
    pub fn list_toilets(&self, limit: usize) -> Result<Vec<Toilet>> {
        let mut toilets: Vec<Toilet> = self.scan_docs(CF_TOILETS)?;
        toilets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        toilets.truncate(limit);
        Ok(toilets)
    }

    /// Toilets waiting for moderation, oldest first
    pub fn pending_toilets(&self) -> Result<Vec<Toilet>> {
        let mut toilets: Vec<Toilet> = self
            .scan_docs::<Toilet>(CF_TOILETS)?
            .into_iter()
            .filter(|t| !t.approved)
            .collect();
        toilets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(toilets)
    }

    /// Geospatial near-query.
    ///
    /// Returns toilets within `max_meters` of `center`, ordered by ascending
    /// distance (ties broken by id), at most `limit` entries.
    pub fn find_toilets_near(
        &self,
        center: GeoPoint,
        max_meters: f64,
        limit: usize,
        only_approved: bool,
    ) -> Result<Vec<(Toilet, f64)>> {
        let bbox = center.bounding_box(max_meters);

        let mut hits: Vec<(Toilet, f64)> = self
            .scan_docs::<Toilet>(CF_TOILETS)?
            .into_iter()
            .filter(|t| !only_approved || t.approved)
            .filter(|t| bbox.contains(&t.location))
            .map(|t| {
                let distance = center.distance_meters(&t.location);
                (t, distance)
            })
            .filter(|(_, distance)| *distance <= max_meters)
            .collect();

        hits.sort_by(|(a, da), (b, db)| da.total_cmp(db).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);

        debug!(
            lon = center.lon,
            lat = center.lat,
            max_meters,
            found = hits.len(),
            "Near query"
        );
        Ok(hits)
    }

    /// Delete a toilet together with its comments, ratings and image
    /// metadata in one atomic batch.
    ///
    /// Returns the removed image metadata so the caller can drop the blobs.
    pub fn delete_toilet_cascade(&self, id: Uuid) -> Result<(Toilet, Vec<ImageMeta>)> {
        let _guard = self.lock()?;
        let toilet = self.require_toilet(id)?;
        let mut batch = WriteBatch::default();

        self.delete_key(&mut batch, CF_TOILETS, &id.to_string())?;

        for comment_id in &toilet.comment_ids {
            self.delete_key(&mut batch, CF_COMMENTS, &comment_id.to_string())?;
        }

        let rating_prefix = format!("{}:", id);
        let rating_entries = self.scan_prefix(CF_TOILET_RATINGS, &rating_prefix)?;
        for (key, _) in &rating_entries {
            self.delete_key(&mut batch, CF_TOILET_RATINGS, key)?;
            let Some(rating_id) = key
                .strip_prefix(&rating_prefix)
                .and_then(|s| Uuid::parse_str(s).ok())
            else {
                warn!(key = %key, "Malformed toilet rating index key");
                continue;
            };
            if let Some(rating) = self.get_rating(rating_id)? {
                self.delete_key(
                    &mut batch,
                    CF_USER_RATINGS,
                    &format!("{}:{}", rating.user_id, id),
                )?;
            }
            self.delete_key(&mut batch, CF_RATINGS, &rating_id.to_string())?;
        }

        let mut images = Vec::new();
        for image_id in toilet.all_image_ids() {
            if let Some(meta) = self.get_image(image_id)? {
                self.delete_key(&mut batch, CF_IMAGES, &image_id.to_string())?;
                images.push(meta);
            }
        }

        self.write(batch)?;

        info!(
            id = %id,
            comments = toilet.comment_ids.len(),
            ratings = rating_entries.len(),
            images = images.len(),
            "Deleted toilet with dependents"
        );
        Ok((toilet, images))
    }

    // =========================================================================
    // Comment operations
    // =========================================================================

    /// Store a comment and append its id to the toilet's reference list
    pub fn insert_comment_linked(&self, comment: &Comment, toilet_id: Uuid) -> Result<Toilet> {
        let _guard = self.lock()?;
        let mut toilet = self.require_toilet(toilet_id)?;
        toilet.comment_ids.push(comment.id);

        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_COMMENTS, &comment.id.to_string(), comment)?;
        self.put_doc(&mut batch, CF_TOILETS, &toilet_id.to_string(), &toilet)?;
        self.write(batch)?;

        debug!(id = %comment.id, toilet_id = %toilet_id, "Inserted comment");
        Ok(toilet)
    }

    pub fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        self.get_doc(CF_COMMENTS, &id.to_string())
    }

    /// Apply `f` to a stored comment; a comment deleted meanwhile is not revived
    pub fn update_comment<F>(&self, id: Uuid, f: F) -> Result<Comment>
    where
        F: FnOnce(&mut Comment),
    {
        let _guard = self.lock()?;
        let mut comment = self.get_comment(id)?.ok_or(AppError::CommentNotFound(id))?;
        f(&mut comment);

        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_COMMENTS, &id.to_string(), &comment)?;
        self.write(batch)?;

        debug!(id = %id, "Updated comment");
        Ok(comment)
    }

    /// Delete the comment record only, leaving toilet references untouched
    pub fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let _guard = self.lock()?;
        if self.get_comment(id)?.is_none() {
            return Ok(false);
        }
        let mut batch = WriteBatch::default();
        self.delete_key(&mut batch, CF_COMMENTS, &id.to_string())?;
        self.write(batch)?;

        debug!(id = %id, "Deleted comment");
        Ok(true)
    }

    /// Delete the comment and strip its id from every toilet referencing it
    pub fn delete_comment_and_unlink(&self, id: Uuid) -> Result<bool> {
        let _guard = self.lock()?;
        if self.get_comment(id)?.is_none() {
            return Ok(false);
        }

        let mut batch = WriteBatch::default();
        self.delete_key(&mut batch, CF_COMMENTS, &id.to_string())?;

        let mut unlinked = 0usize;
        for mut toilet in self.scan_docs::<Toilet>(CF_TOILETS)? {
            if toilet.unlink_comment(id) {
                self.put_doc(&mut batch, CF_TOILETS, &toilet.id.to_string(), &toilet)?;
                unlinked += 1;
            }
        }
        self.write(batch)?;

        debug!(id = %id, toilets = unlinked, "Deleted and unlinked comment");
        Ok(true)
    }

    // =========================================================================
    // Rating operations
    // =========================================================================

    /// Store a new rating; one rating per user and toilet
    pub fn insert_rating(&self, rating: &Rating) -> Result<()> {
        let _guard = self.lock()?;
        let mut toilet = self.require_toilet(rating.toilet_id)?;

        let user_key = format!("{}:{}", rating.user_id, rating.toilet_id);
        let cf_user_ratings = self.cf(CF_USER_RATINGS)?;
        if self.db.get_cf(&cf_user_ratings, user_key.as_bytes())?.is_some() {
            return Err(AppError::conflict(format!(
                "User {} already rated toilet {}",
                rating.user_id, rating.toilet_id
            )));
        }

        toilet.rating_total += u64::from(rating.value.get());

        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_RATINGS, &rating.id.to_string(), rating)?;
        batch.put_cf(
            &self.cf(CF_TOILET_RATINGS)?,
            format!("{}:{}", rating.toilet_id, rating.id).as_bytes(),
            [rating.value.get()],
        );
        batch.put_cf(
            &cf_user_ratings,
            user_key.as_bytes(),
            rating.id.to_string().as_bytes(),
        );
        self.put_doc(&mut batch, CF_TOILETS, &toilet.id.to_string(), &toilet)?;
        self.write(batch)?;

        debug!(id = %rating.id, toilet_id = %rating.toilet_id, value = rating.value.get(), "Inserted rating");
        Ok(())
    }

    pub fn get_rating(&self, id: Uuid) -> Result<Option<Rating>> {
        self.get_doc(CF_RATINGS, &id.to_string())
    }

    /// Change the value of an existing rating
    pub fn update_rating_value(&self, id: Uuid, value: RatingValue) -> Result<Rating> {
        let _guard = self.lock()?;
        let mut rating = self.get_rating(id)?.ok_or(AppError::RatingNotFound(id))?;
        let old_value = u64::from(rating.value.get());
        rating.value = value;
        rating.updated_at = Utc::now();

        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_RATINGS, &id.to_string(), &rating)?;
        batch.put_cf(
            &self.cf(CF_TOILET_RATINGS)?,
            format!("{}:{}", rating.toilet_id, id).as_bytes(),
            [value.get()],
        );
        match self.get_toilet(rating.toilet_id)? {
            Some(mut toilet) => {
                toilet.rating_total =
                    toilet.rating_total.saturating_sub(old_value) + u64::from(value.get());
                self.put_doc(&mut batch, CF_TOILETS, &toilet.id.to_string(), &toilet)?;
            }
            None => warn!(id = %id, toilet_id = %rating.toilet_id, "Rating refers to missing toilet"),
        }
        self.write(batch)?;

        debug!(id = %id, value = value.get(), "Updated rating");
        Ok(rating)
    }

    /// Delete a rating and its index entries
    pub fn delete_rating(&self, id: Uuid) -> Result<bool> {
        let _guard = self.lock()?;
        let Some(rating) = self.get_rating(id)? else {
            return Ok(false);
        };

        let mut batch = WriteBatch::default();
        self.delete_key(&mut batch, CF_RATINGS, &id.to_string())?;
        self.delete_key(
            &mut batch,
            CF_TOILET_RATINGS,
            &format!("{}:{}", rating.toilet_id, id),
        )?;
        self.delete_key(
            &mut batch,
            CF_USER_RATINGS,
            &format!("{}:{}", rating.user_id, rating.toilet_id),
        )?;
        if let Some(mut toilet) = self.get_toilet(rating.toilet_id)? {
            toilet.rating_total = toilet
                .rating_total
                .saturating_sub(u64::from(rating.value.get()));
            self.put_doc(&mut batch, CF_TOILETS, &toilet.id.to_string(), &toilet)?;
        }
        self.write(batch)?;

        debug!(id = %id, "Deleted rating");
        Ok(true)
    }

    /// Aggregate sum and count over the toilet's ratings
    pub fn rating_summary(&self, toilet_id: Uuid) -> Result<RatingSummary> {
        let entries = self.scan_prefix(CF_TOILET_RATINGS, &format!("{}:", toilet_id))?;
        let sum: u64 = entries
            .iter()
            .filter_map(|(_, value)| value.first())
            .map(|v| u64::from(*v))
            .sum();
        Ok(RatingSummary::from_totals(sum, entries.len() as u64))
    }

    // =========================================================================
    // User operations
    // =========================================================================

    /// Store a new user; emails are unique
    pub fn insert_user(&self, user: &User) -> Result<()> {
        let _guard = self.lock()?;
        let cf_emails = self.cf(CF_USER_EMAILS)?;
        if self.db.get_cf(&cf_emails, user.email.as_bytes())?.is_some() {
            return Err(AppError::conflict(format!(
                "A user with email {} already exists",
                user.email
            )));
        }

        let mut batch = WriteBatch::default();
        self.put_doc(&mut batch, CF_USERS, &user.id.to_string(), user)?;
        batch.put_cf(
            &cf_emails,
            user.email.as_bytes(),
            user.id.to_string().as_bytes(),
        );
        self.write(batch)?;

        debug!(id = %user.id, "Inserted user");
        Ok(())
    }

    pub fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        self.get_doc(CF_USERS, &id.to_string())
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let cf = self.cf(CF_USER_EMAILS)?;
        match self.db.get_cf(&cf, normalize_email(email).as_bytes())? {
            Some(id_bytes) => {
                let id = Uuid::parse_str(&String::from_utf8_lossy(&id_bytes)).map_err(|e| {
                    AppError::internal(format!("Corrupt email index entry for {}: {}", email, e))
                })?;
                self.get_user(id)
            }
            None => Ok(None),
        }
    }

    // =========================================================================
    // Image operations
    // =========================================================================

    /// Store image metadata and link it to its toilet.
    ///
    /// When the image becomes the toilet's preview, the previous preview's
    /// metadata is removed in the same batch and returned so the caller can
    /// drop its blob.
    pub fn insert_image(&self, meta: &ImageMeta) -> Result<Option<ImageMeta>> {
        let _guard = self.lock()?;
        let mut batch = WriteBatch::default();
        let mut replaced = None;

        if let Some(toilet_id) = meta.toilet_id {
            let mut toilet = self.require_toilet(toilet_id)?;
            if meta.preview {
                if let Some(old_id) = toilet.preview.replace(meta.id) {
                    if let Some(old) = self.get_image(old_id)? {
                        self.delete_key(&mut batch, CF_IMAGES, &old_id.to_string())?;
                        replaced = Some(old);
                    }
                }
            } else {
                toilet.image_ids.push(meta.id);
            }
            self.put_doc(&mut batch, CF_TOILETS, &toilet_id.to_string(), &toilet)?;
        }

        self.put_doc(&mut batch, CF_IMAGES, &meta.id.to_string(), meta)?;
        self.write(batch)?;

        debug!(id = %meta.id, toilet_id = ?meta.toilet_id, preview = meta.preview, "Inserted image metadata");
        Ok(replaced)
    }

    pub fn get_image(&self, id: Uuid) -> Result<Option<ImageMeta>> {
        self.get_doc(CF_IMAGES, &id.to_string())
    }

    /// Delete image metadata and unlink it from its toilet
    pub fn delete_image(&self, id: Uuid) -> Result<Option<ImageMeta>> {
        let _guard = self.lock()?;
        let Some(meta) = self.get_image(id)? else {
            return Ok(None);
        };

        let mut batch = WriteBatch::default();
        self.delete_key(&mut batch, CF_IMAGES, &id.to_string())?;
        if let Some(toilet_id) = meta.toilet_id {
            if let Some(mut toilet) = self.get_toilet(toilet_id)? {
                if toilet.unlink_image(id) {
                    self.put_doc(&mut batch, CF_TOILETS, &toilet_id.to_string(), &toilet)?;
                }
            }
        }
        self.write(batch)?;

        debug!(id = %id, "Deleted image metadata");
        Ok(Some(meta))
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    pub fn stats(&self) -> Result<DatabaseStats> {
        Ok(DatabaseStats {
            toilets: self.count(CF_TOILETS)?,
            comments: self.count(CF_COMMENTS)?,
            ratings: self.count(CF_RATINGS)?,
            users: self.count(CF_USERS)?,
            images: self.count(CF_IMAGES)?,
        })
    }

    /// Cheap liveness probe
    pub fn ping(&self) -> Result<()> {
        let cf = self.cf(CF_TOILETS)?;
        self.db.get_cf(&cf, b"__ping__")?;
        Ok(())
    }
}
