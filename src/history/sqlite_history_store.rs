use super::models::{
    OrderedAlbumRef, OrderedTrackRef, PriorRecommendations, RecommendationRecord,
    RecommendationType,
};
use super::store::HistoryStore;
use crate::enrichment::VideoData;
use crate::sqlite_column;
use crate::sqlite_persistence::{
    read_schema_version, Column, ForeignKey, ForeignKeyOnChange, SqlType, Table, VersionedSchema,
    DEFAULT_TIMESTAMP,
};
use anyhow::{anyhow, bail, Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

const RECOMMENDATION_FK: ForeignKey = ForeignKey {
    foreign_table: "recommendation",
    foreign_column: "id",
    on_delete: ForeignKeyOnChange::Cascade,
};

/// V 0
const PLAYED_TRACK_TABLE_V_0: Table = Table {
    name: "played_track",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("track_id", &SqlType::Text, non_null = true),
        sqlite_column!(
            "played_at",
            &SqlType::Integer,
            default_value = Some(DEFAULT_TIMESTAMP)
        ),
    ],
    indices: &[("idx_played_track_user", "user_id")],
};
const RECOMMENDATION_TABLE_V_0: Table = Table {
    name: "recommendation",
    columns: &[
        sqlite_column!("id", &SqlType::Text, is_primary_key = true),
        sqlite_column!("user_id", &SqlType::Text, non_null = true),
        sqlite_column!("type", &SqlType::Text, non_null = true),
        sqlite_column!("mood", &SqlType::Text, non_null = true),
        sqlite_column!("genres", &SqlType::Text, non_null = true),
        sqlite_column!("parameters", &SqlType::Text, non_null = true),
        sqlite_column!("created", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_recommendation_user", "user_id")],
};
const RECOMMENDATION_TRACK_TABLE_V_0: Table = Table {
    name: "recommendation_track",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "recommendation_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&RECOMMENDATION_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("track_id", &SqlType::Text, non_null = true),
        sqlite_column!("track_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!("album_cover", &SqlType::Text),
        sqlite_column!("preview_url", &SqlType::Text),
        sqlite_column!("spotify_url", &SqlType::Text),
        sqlite_column!("youtube_video_id", &SqlType::Text),
        sqlite_column!("youtube_title", &SqlType::Text),
        sqlite_column!("youtube_thumbnail", &SqlType::Text),
    ],
    indices: &[("idx_recommendation_track_rec", "recommendation_id")],
};
const RECOMMENDATION_ALBUM_TABLE_V_0: Table = Table {
    name: "recommendation_album",
    columns: &[
        sqlite_column!("id", &SqlType::Integer, is_primary_key = true),
        sqlite_column!(
            "recommendation_id",
            &SqlType::Text,
            non_null = true,
            foreign_key = Some(&RECOMMENDATION_FK)
        ),
        sqlite_column!("position", &SqlType::Integer, non_null = true),
        sqlite_column!("album_id", &SqlType::Text, non_null = true),
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("album_cover", &SqlType::Text),
        sqlite_column!("release_date", &SqlType::Text),
        sqlite_column!("spotify_url", &SqlType::Text),
    ],
    indices: &[("idx_recommendation_album_rec", "recommendation_id")],
};

pub const VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 0,
    tables: &[
        PLAYED_TRACK_TABLE_V_0,
        RECOMMENDATION_TABLE_V_0,
        RECOMMENDATION_TRACK_TABLE_V_0,
        RECOMMENDATION_ALBUM_TABLE_V_0,
    ],
}];

#[derive(Clone)]
pub struct SqliteHistoryStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteHistoryStore {
    pub fn new<T: AsRef<Path>>(db_path: T) -> Result<Self> {
        let db_path = db_path.as_ref();
        let is_new = !db_path.exists();
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open history database {:?}", db_path))?;

        let latest = VERSIONED_SCHEMAS
            .last()
            .context("No history schema defined")?;
        if is_new {
            info!("Creating history database at {:?}", db_path);
            latest.create(&conn)?;
        } else {
            conn.execute("PRAGMA foreign_keys = ON;", [])?;
        }

        let version = read_schema_version(&conn)?;
        match VERSIONED_SCHEMAS.get(version) {
            Some(schema) => schema.validate(&conn)?,
            None => bail!("History database version {} is too new", version),
        }
        debug!("History database at version {}", version);

        Ok(SqliteHistoryStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("History database lock poisoned"))
    }

    fn load_tracks(conn: &Connection, recommendation_id: &str) -> Result<Vec<OrderedTrackRef>> {
        let mut stmt = conn.prepare(
            "SELECT position, track_id, track_name, artist_name, album_name, album_cover,
                    preview_url, spotify_url, youtube_video_id, youtube_title, youtube_thumbnail
             FROM recommendation_track WHERE recommendation_id = ?1 ORDER BY position",
        )?;
        let tracks = stmt
            .query_map(params![recommendation_id], |row| {
                let video_id: Option<String> = row.get(8)?;
                let youtube_data = match video_id {
                    Some(video_id) => Some(VideoData {
                        video_id,
                        title: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
                        thumbnail: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                    }),
                    None => None,
                };
                Ok(OrderedTrackRef {
                    position: row.get::<_, i64>(0)? as usize,
                    track_id: row.get(1)?,
                    track_name: row.get(2)?,
                    artist_name: row.get(3)?,
                    album_name: row.get(4)?,
                    album_cover: row.get(5)?,
                    preview_url: row.get(6)?,
                    spotify_url: row.get(7)?,
                    youtube_data,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tracks)
    }

    fn load_albums(conn: &Connection, recommendation_id: &str) -> Result<Vec<OrderedAlbumRef>> {
        let mut stmt = conn.prepare(
            "SELECT position, album_id, album_name, artist_name, album_cover, release_date,
                    spotify_url
             FROM recommendation_album WHERE recommendation_id = ?1 ORDER BY position",
        )?;
        let albums = stmt
            .query_map(params![recommendation_id], |row| {
                Ok(OrderedAlbumRef {
                    position: row.get::<_, i64>(0)? as usize,
                    album_id: row.get(1)?,
                    album_name: row.get(2)?,
                    artist_name: row.get(3)?,
                    album_cover: row.get(4)?,
                    release_date: row.get(5)?,
                    spotify_url: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(albums)
    }
}

impl HistoryStore for SqliteHistoryStore {
    fn record_played(&self, user_id: &str, track_id: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO played_track (user_id, track_id) VALUES (?1, ?2)",
            params![user_id, track_id],
        )
        .with_context(|| format!("Failed to record play of {} for {}", track_id, user_id))?;
        Ok(())
    }

    fn get_recently_played(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT track_id FROM played_track WHERE user_id = ?1
             GROUP BY track_id ORDER BY MAX(id) DESC LIMIT ?2",
        )?;
        let ids = stmt
            .query_map(params![user_id, limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn get_recommendation_history(
        &self,
        user_id: &str,
        lookback: usize,
    ) -> Result<PriorRecommendations> {
        let conn = self.conn()?;
        let recent_ids_sql = "SELECT id FROM recommendation WHERE user_id = ?1
                              ORDER BY created DESC, rowid DESC LIMIT ?2";

        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT track_id FROM recommendation_track WHERE recommendation_id IN ({})",
            recent_ids_sql
        ))?;
        let track_ids = stmt
            .query_map(params![user_id, lookback as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT DISTINCT album_id FROM recommendation_album WHERE recommendation_id IN ({})",
            recent_ids_sql
        ))?;
        let album_ids = stmt
            .query_map(params![user_id, lookback as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(PriorRecommendations {
            track_ids,
            album_ids,
        })
    }

    fn save_recommendation(&self, user_id: &str, record: &RecommendationRecord) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO recommendation (id, user_id, type, mood, genres, parameters, created)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id,
                user_id,
                record.kind.to_db_str(),
                record.mood,
                serde_json::to_string(&record.genres)?,
                serde_json::to_string(&record.parameters)?,
                record.created_at,
            ],
        )
        .with_context(|| format!("Failed to insert recommendation {}", record.id))?;

        for track in &record.tracks {
            let video = track.youtube_data.as_ref();
            tx.execute(
                "INSERT INTO recommendation_track (recommendation_id, position, track_id,
                    track_name, artist_name, album_name, album_cover, preview_url, spotify_url,
                    youtube_video_id, youtube_title, youtube_thumbnail)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    record.id,
                    track.position as i64,
                    track.track_id,
                    track.track_name,
                    track.artist_name,
                    track.album_name,
                    track.album_cover,
                    track.preview_url,
                    track.spotify_url,
                    video.map(|v| v.video_id.as_str()),
                    video.map(|v| v.title.as_str()),
                    video.map(|v| v.thumbnail.as_str()),
                ],
            )?;
        }

        for album in &record.albums {
            tx.execute(
                "INSERT INTO recommendation_album (recommendation_id, position, album_id,
                    album_name, artist_name, album_cover, release_date, spotify_url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.id,
                    album.position as i64,
                    album.album_id,
                    album.album_name,
                    album.artist_name,
                    album.album_cover,
                    album.release_date,
                    album.spotify_url,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<RecommendationRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, type, mood, genres, parameters, created FROM recommendation
             WHERE user_id = ?1 ORDER BY created DESC, rowid DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![user_id, limit as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, i64>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(rows.len());
        for (id, kind, mood, genres, parameters, created_at) in rows {
            let kind = RecommendationType::from_db_str(&kind)
                .with_context(|| format!("Unknown recommendation type {}", kind))?;
            let tracks = Self::load_tracks(&conn, &id)?;
            let albums = Self::load_albums(&conn, &id)?;
            records.push(RecommendationRecord {
                user_id: user_id.to_string(),
                kind,
                mood,
                genres: serde_json::from_str(&genres)?,
                parameters: serde_json::from_str(&parameters)?,
                tracks,
                albums,
                created_at,
                id,
            });
        }
        Ok(records)
    }
}
