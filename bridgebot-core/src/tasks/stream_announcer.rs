//! Polls the streaming API on a fixed period and announces newly-live
//! broadcasts to the configured discord channels.
//!
//! Two caches are kept: every live stream, and the speedrun-tagged subset.
//! A cached entry accrues a miss count for each cycle its id is absent from
//! the live set and is evicted once the count passes the threshold; while an
//! entry is resident its stream is announced at most once, and a restarted
//! stream with a fresh id but identical (user, title, game) is treated as a
//! continuation rather than re-announced.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use bridgebot_common::models::{AnnounceType, StreamInfo};
use bridgebot_common::traits::platform_traits::{ChatSender, StreamSource};
use bridgebot_common::traits::repository_traits::AnnounceChannelRepository;

use crate::Error;

pub const ANNOUNCE_CHECK_PERIOD: Duration = Duration::from_secs(15);
pub const CYCLE_TIMEOUT: Duration = Duration::from_secs(60);
/// 120 misses at a 15s period is roughly 30 minutes offline before an entry
/// is dropped.
pub const MISS_THRESHOLD: u32 = 120;

const SPEEDRUN_TAGS: [&str; 3] = ["speedrun", "speedruns", "rta"];

#[derive(Debug, Clone)]
struct CacheEntry {
    stream: StreamInfo,
    miss_count: u32,
}

/// Announcement cache keyed by stream id.
#[derive(Default)]
pub struct AnnounceCache {
    entries: HashMap<String, CacheEntry>,
}

impl AnnounceCache {
    /// Increments the miss count of every cached entry absent from the live
    /// set and evicts entries whose count passed `threshold`.
    fn count_misses(&mut self, live_ids: &HashSet<String>, threshold: u32) {
        for (id, entry) in self.entries.iter_mut() {
            if !live_ids.contains(id) {
                entry.miss_count += 1;
            }
        }
        self.entries.retain(|_, e| e.miss_count <= threshold);
    }

    fn contains(&self, stream_id: &str) -> bool {
        self.entries.contains_key(stream_id)
    }

    /// True when some resident entry carries the same (user, title, game)
    /// triple -- the restarted-stream case.
    fn matches_resident(&self, stream: &StreamInfo) -> bool {
        self.entries.values().any(|e| {
            e.stream.user == stream.user
                && e.stream.title == stream.title
                && e.stream.game == stream.game
        })
    }

    /// Refreshes the cached fields and clears the miss count, keeping the
    /// entry alive without re-announcing.
    fn refresh(&mut self, stream: &StreamInfo) {
        self.entries.insert(
            stream.id.clone(),
            CacheEntry {
                stream: stream.clone(),
                miss_count: 0,
            },
        );
    }

    fn insert(&mut self, stream: &StreamInfo) {
        self.refresh(stream);
    }

    /// Streams present in the most recent poll.
    fn active(&self) -> Vec<StreamInfo> {
        let mut out: Vec<StreamInfo> = self
            .entries
            .values()
            .filter(|e| e.miss_count == 0)
            .map(|e| e.stream.clone())
            .collect();
        out.sort_by(|a, b| a.user.cmp(&b.user));
        out
    }
}

/// Read-only view of the all-streams cache for the `streams` chat command.
#[derive(Clone)]
pub struct StreamCacheHandle(Arc<Mutex<AnnounceCache>>);

impl StreamCacheHandle {
    pub async fn active_streams(&self) -> Vec<StreamInfo> {
        self.0.lock().await.active()
    }
}

pub struct StreamAnnouncer {
    api: Arc<dyn StreamSource>,
    discord: Arc<dyn ChatSender>,
    announce_repo: Arc<dyn AnnounceChannelRepository>,
    watched_game_ids: Vec<String>,
    process_start: DateTime<Utc>,
    all_streams: Arc<Mutex<AnnounceCache>>,
    speedrun_streams: Arc<Mutex<AnnounceCache>>,
    in_progress: AtomicBool,
    miss_threshold: u32,
}

impl StreamAnnouncer {
    pub fn new(
        api: Arc<dyn StreamSource>,
        discord: Arc<dyn ChatSender>,
        announce_repo: Arc<dyn AnnounceChannelRepository>,
        watched_game_ids: Vec<String>,
    ) -> Self {
        Self {
            api,
            discord,
            announce_repo,
            watched_game_ids,
            process_start: Utc::now(),
            all_streams: Arc::new(Mutex::new(AnnounceCache::default())),
            speedrun_streams: Arc::new(Mutex::new(AnnounceCache::default())),
            in_progress: AtomicBool::new(false),
            miss_threshold: MISS_THRESHOLD,
        }
    }

    /// Overrides the boot timestamp used for the "already live before we
    /// started" filter.
    pub fn with_process_start(mut self, start: DateTime<Utc>) -> Self {
        self.process_start = start;
        self
    }

    pub fn with_miss_threshold(mut self, threshold: u32) -> Self {
        self.miss_threshold = threshold;
        self
    }

    pub fn cache_handle(&self) -> StreamCacheHandle {
        StreamCacheHandle(self.all_streams.clone())
    }

    /// One poll cycle. Callers must serialize invocations; the scheduled loop
    /// does so with the in-progress guard.
    pub async fn run_cycle(&self) -> Result<(), Error> {
        debug!("starting check for streams");

        let watched_channels: Vec<String> = self
            .announce_repo
            .list_by_type(AnnounceType::Stream)
            .await?
            .into_iter()
            .map(|c| c.channel)
            .collect();

        let mut streams = self.api.get_streams_by_user_ids(&watched_channels).await?;
        streams.extend(self.api.get_streams_by_game_ids(&self.watched_game_ids).await?);

        // A stream can satisfy both queries; keep the first occurrence.
        let mut seen = HashSet::new();
        streams.retain(|s| seen.insert(s.id.clone()));
        let live_ids: HashSet<String> = streams.iter().map(|s| s.id.clone()).collect();

        self.all_streams
            .lock()
            .await
            .count_misses(&live_ids, self.miss_threshold);
        self.speedrun_streams
            .lock()
            .await
            .count_misses(&live_ids, self.miss_threshold);

        let live_channels = self.announce_repo.list_by_type(AnnounceType::Live).await?;
        let speedrun_channels = self
            .announce_repo
            .list_by_type(AnnounceType::SpeedrunLive)
            .await?;

        for stream in &streams {
            self.consider(&self.all_streams, &live_channels, stream).await?;
            if is_speedrun(stream) {
                self.consider(&self.speedrun_streams, &speedrun_channels, stream)
                    .await?;
            }
        }

        debug!("stream discovery/announce complete");
        Ok(())
    }

    async fn consider(
        &self,
        cache: &Arc<Mutex<AnnounceCache>>,
        destinations: &[bridgebot_common::models::AnnounceChannel],
        stream: &StreamInfo,
    ) -> Result<(), Error> {
        let mut cache = cache.lock().await;
        if cache.contains(&stream.id) {
            cache.refresh(stream);
            return Ok(());
        }
        // Streams already live at boot are neither announced nor cached,
        // so a restart survives reboots without a duplicate announcement.
        if stream.started_at <= self.process_start {
            return Ok(());
        }
        // Same broadcast under a new id: a continuation, not news.
        if cache.matches_resident(stream) {
            return Ok(());
        }

        if destinations.is_empty() {
            info!(stream = %stream.id, user = %stream.user, "new stream with no announce channels");
        } else {
            let message = format!(
                "{} is live playing: {}\n<{}>\n{}",
                stream.user,
                stream.game,
                stream.url(),
                stream.title
            );
            for dest in destinations {
                if let Err(e) = self.discord.send_message(&dest.channel, &message).await {
                    error!(channel = %dest.channel, "failed to send announcement: {e:?}");
                }
            }
            info!(stream = %stream.id, user = %stream.user, "announced stream");
        }
        cache.insert(stream);
        Ok(())
    }

    /// Spawns the repeating poll loop. A tick that fires while a cycle is
    /// still running is dropped, not queued; a cycle that outlives the
    /// timeout is abandoned and the guard cleared for the next tick.
    pub fn spawn(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        info!(
            "scheduling stream checks every {} seconds",
            ANNOUNCE_CHECK_PERIOD.as_secs()
        );
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ANNOUNCE_CHECK_PERIOD);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.in_progress.swap(true, Ordering::SeqCst) {
                            warn!("previous poll cycle still running; skipping tick");
                            continue;
                        }
                        match tokio::time::timeout(CYCLE_TIMEOUT, self.run_cycle()).await {
                            Ok(Ok(())) => {}
                            Ok(Err(e)) => error!("error fetching/announcing streams: {e:?}"),
                            Err(_) => error!(
                                "poll cycle exceeded {}s timeout; abandoning",
                                CYCLE_TIMEOUT.as_secs()
                            ),
                        }
                        self.in_progress.store(false, Ordering::SeqCst);
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("stream announcer stopped");
        })
    }
}

fn is_speedrun(stream: &StreamInfo) -> bool {
    stream
        .tags
        .iter()
        .any(|t| SPEEDRUN_TAGS.contains(&t.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: &str, user: &str, title: &str, game: &str) -> StreamInfo {
        StreamInfo {
            id: id.to_string(),
            user: user.to_string(),
            login: user.to_lowercase(),
            title: title.to_string(),
            game: game.to_string(),
            tags: vec![],
            started_at: Utc::now(),
        }
    }

    #[test]
    fn miss_counting_evicts_past_threshold() {
        let mut cache = AnnounceCache::default();
        cache.insert(&stream("1", "a", "t", "g"));
        let empty = HashSet::new();
        for _ in 0..3 {
            cache.count_misses(&empty, 3);
        }
        assert!(cache.contains("1"));
        cache.count_misses(&empty, 3);
        assert!(!cache.contains("1"));
    }

    #[test]
    fn refresh_resets_miss_count() {
        let mut cache = AnnounceCache::default();
        cache.insert(&stream("1", "a", "t", "g"));
        let empty = HashSet::new();
        cache.count_misses(&empty, 5);
        cache.count_misses(&empty, 5);
        cache.refresh(&stream("1", "a", "t", "g"));
        let live: HashSet<String> = ["1".to_string()].into();
        cache.count_misses(&live, 5);
        assert_eq!(cache.entries.get("1").unwrap().miss_count, 0);
    }

    #[test]
    fn resident_triple_matches_under_new_id() {
        let mut cache = AnnounceCache::default();
        cache.insert(&stream("1", "runner", "pb attempts", "some game"));
        assert!(cache.matches_resident(&stream("2", "runner", "pb attempts", "some game")));
        assert!(!cache.matches_resident(&stream("2", "runner", "new title", "some game")));
    }

    #[test]
    fn speedrun_tag_matching_is_case_insensitive() {
        let mut s = stream("1", "a", "t", "g");
        s.tags = vec!["English".to_string(), "RTA".to_string()];
        assert!(is_speedrun(&s));
        s.tags = vec!["casual".to_string()];
        assert!(!is_speedrun(&s));
    }
}
