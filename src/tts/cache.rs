//! On-disk cache of rendered speech, one WAV per phrase
//!
//! Renders of the same phrase are serialized by a per-phrase lock. A lock
//! lives only while some request holds it.

use super::Synthesizer;
use crate::error::SynthesisError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Longest file stem kept verbatim; longer phrases get a hashed suffix
const MAX_STEM_BYTES: usize = 200;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
pub struct SpeechCache {
    dir: PathBuf,
    model: PathBuf,
    synthesizer: Arc<dyn Synthesizer>,
    in_progress: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SpeechCache {
    pub fn new(dir: PathBuf, model: PathBuf, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            dir,
            model,
            synthesizer,
            in_progress: Mutex::new(HashMap::new()),
        }
    }

    /// Deterministic location of the rendering of `text`
    pub fn path_for(&self, text: &str) -> PathBuf {
        self.file_for(&cache_key(text))
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.wav"))
    }

    /// Return the cached rendering of `text`, synthesizing it on a miss.
    pub async fn render_or_fetch(&self, text: &str) -> Result<PathBuf, SynthesisError> {
        let key = cache_key(text);

        let slot = {
            let mut in_progress = self.in_progress.lock().await;
            in_progress.entry(key.clone()).or_default().clone()
        };
        let result = {
            let _guard = slot.lock().await;
            self.fetch_or_render(text, &key).await
        };
        self.release(&key, slot).await;
        result
    }

    async fn fetch_or_render(&self, text: &str, key: &str) -> Result<PathBuf, SynthesisError> {
        let path = self.file_for(key);
        if tokio::fs::try_exists(&path).await? {
            debug!("Speech cache hit: {}", path.display());
            return Ok(path);
        }

        info!(
            "🗣️ Speech cache miss for {:?}, synthesizing with {}",
            text,
            self.synthesizer.name()
        );
        tokio::fs::create_dir_all(&self.dir).await?;
        let temp = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            key,
            std::process::id(),
            TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));

        if let Err(e) = self.synthesizer.synthesize(text, &self.model, &temp).await {
            discard(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            discard(&temp).await;
            return Err(e.into());
        }
        Ok(path)
    }

    /// Drop the lock for `key` unless another request is holding or awaiting it
    async fn release(&self, key: &str, slot: Arc<Mutex<()>>) {
        let mut in_progress = self.in_progress.lock().await;
        // Clones are only taken under the map lock: the map and `slot` itself
        if Arc::strong_count(&slot) == 2 {
            in_progress.remove(key);
        }
    }
}

async fn discard(temp: &Path) {
    if let Err(e) = tokio::fs::remove_file(temp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("⚠️ Could not remove {}: {}", temp.display(), e);
        }
    }
}

/// File stem for `text`: trimmed, path-safe, bounded in length.
///
/// Stems that had to be altered carry a hash of the trimmed text, so two
/// phrases never share a file.
pub fn cache_key(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "_".to_string();
    }

    let mut altered = false;
    let mut cleaned: String = text
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => {
                altered = true;
                '_'
            }
            c => c,
        })
        .collect();

    if cleaned.len() > MAX_STEM_BYTES {
        let mut cut = MAX_STEM_BYTES;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
        altered = true;
    }

    if altered {
        format!("{}-{:016x}", cleaned, fnv1a(text.as_bytes()))
    } else {
        cleaned
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325_u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
