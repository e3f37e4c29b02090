use minstrel_core::{new_id, now_rfc3339};
use minstrel_sql::Value;

use crate::model::Music;
use crate::service::{BlogError, BlogService, ACCEPTED_AUDIO_TYPES};

impl BlogService {
    /// Store an audio upload and create its metadata record.
    pub fn upload_music(
        &self,
        singer: Option<&str>,
        song_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<Music, BlogError> {
        if !ACCEPTED_AUDIO_TYPES.contains(&content_type) {
            return Err(BlogError::Validation(format!(
                "unsupported audio type '{}'",
                content_type
            )));
        }
        if data.len() > self.config.max_music_size {
            return Err(BlogError::Validation(format!(
                "audio exceeds maximum size of {} bytes",
                self.config.max_music_size
            )));
        }
        let song_name = song_name.trim();
        if song_name.is_empty() {
            return Err(BlogError::Validation("song name is required".into()));
        }

        let id = new_id();
        let key = format!("music/{}.mp3", id);
        self.blob.put(&key, data)?;

        let music = Music {
            id: id.clone(),
            singer: singer.map(str::to_string),
            song_name: song_name.to_string(),
            content_type: content_type.to_string(),
            blob_key: key,
            size: data.len() as u64,
            created_at: now_rfc3339(),
        };

        self.insert_record(
            "music",
            &id,
            &music,
            &[("created_at", Value::Text(music.created_at.clone()))],
        )?;

        Ok(music)
    }

    /// Get audio metadata by id.
    pub fn get_music(&self, id: &str) -> Result<Music, BlogError> {
        self.get_record("music", id)
    }

    /// Get audio metadata plus the stored bytes.
    pub fn fetch_music(&self, id: &str) -> Result<(Music, Vec<u8>), BlogError> {
        let music = self.get_music(id)?;
        let data = self
            .blob
            .get(&music.blob_key)?
            .ok_or_else(|| BlogError::NotFound(format!("music/{} data missing", id)))?;
        Ok((music, data))
    }
}

#[cfg(test)]
mod tests {
    use crate::service::testutil::test_service;
    use crate::service::BlogError;

    #[test]
    fn upload_and_fetch() {
        let (_tmp, svc) = test_service();

        let music = svc
            .upload_music(Some("Artist"), "Song", "audio/mpeg", b"mp3-bytes")
            .unwrap();
        assert_eq!(music.size, 9);
        assert!(music.blob_key.starts_with("music/"));

        let (meta, data) = svc.fetch_music(&music.id).unwrap();
        assert_eq!(meta.song_name, "Song");
        assert_eq!(data, b"mp3-bytes");
    }

    #[test]
    fn upload_validates_type_and_size() {
        let (_tmp, svc) = test_service();

        let err = svc
            .upload_music(None, "Song", "audio/ogg", b"bytes")
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));

        let big = vec![0u8; 11 * 1024 * 1024];
        let err = svc
            .upload_music(None, "Song", "audio/mpeg", &big)
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));

        let err = svc
            .upload_music(None, "  ", "audio/mpeg", b"bytes")
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));
    }

    #[test]
    fn missing_music_is_not_found() {
        let (_tmp, svc) = test_service();
        assert!(matches!(
            svc.get_music("missing").unwrap_err(),
            BlogError::NotFound(_)
        ));
    }
}
