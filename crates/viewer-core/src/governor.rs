use crate::cache::RenderCache;
use crate::memory::{MemoryProbe, MemoryUsage, ProcessMemoryProbe};
use crate::virtualization::{cull, prefetch_page_indices, visible_range};
use doc_model::{Boundary, Element, Rect};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernorConfig {
    pub cache_capacity: usize,
    /// Used-to-limit memory ratio above which the cache is cleared
    pub pressure_threshold: f64,
    pub memory_check_interval: Duration,
    pub optimize_interval: Duration,
    pub overscan: usize,
    pub prefetch_radius: u32,
    pub boundary: Boundary,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            cache_capacity: 64,
            pressure_threshold: 0.8,
            memory_check_interval: Duration::from_secs(30),
            optimize_interval: Duration::from_secs(60),
            overscan: 2,
            prefetch_radius: 2,
            boundary: Boundary::Inclusive,
        }
    }
}

impl GovernorConfig {
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    pub fn with_pressure_threshold(mut self, threshold: f64) -> Self {
        self.pressure_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    pub fn with_intervals(mut self, memory_check: Duration, optimize: Duration) -> Self {
        self.memory_check_interval = memory_check;
        self.optimize_interval = optimize;
        self
    }

    pub fn with_boundary(mut self, boundary: Boundary) -> Self {
        self.boundary = boundary;
        self
    }
}

/// Key of a rendered page in the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderKey {
    pub page_index: u32,
    pub zoom_percent: u16,
}

impl RenderKey {
    pub fn new(page_index: u32, zoom_percent: u16) -> Self {
        Self { page_index, zoom_percent }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GovernorStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub evictions: u64,
    pub pressure_clears: u64,
    pub sweeps: u64,
    pub culled: u64,
    pub last_usage: Option<MemoryUsage>,
}

/// What one [`Governor::tick`] did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub memory_checked: bool,
    pub cache_cleared: bool,
    pub swept: bool,
    pub evicted: usize,
}

/// Decides what the viewer renders and caches. It never touches the
/// document; the worst it does is drop cached renders.
pub struct Governor<V> {
    config: GovernorConfig,
    cache: RenderCache<RenderKey, V>,
    probe: Box<dyn MemoryProbe>,
    stats: GovernorStats,
    last_memory_check: Option<Instant>,
    last_sweep: Option<Instant>,
}

impl<V> Governor<V> {
    pub fn new(config: GovernorConfig, probe: Box<dyn MemoryProbe>) -> Self {
        let cache = RenderCache::new(config.cache_capacity);
        Self {
            config,
            cache,
            probe,
            stats: GovernorStats::default(),
            last_memory_check: None,
            last_sweep: None,
        }
    }

    pub fn with_process_probe(config: GovernorConfig) -> Self {
        Self::new(config, Box::new(ProcessMemoryProbe))
    }

    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    pub fn stats(&self) -> &GovernorStats {
        &self.stats
    }

    /// Page indices to lay out for the current scroll position.
    pub fn visible_pages(
        &self,
        page_count: usize,
        viewport_extent: f32,
        scroll_offset: f32,
        page_extent: f32,
    ) -> Option<RangeInclusive<usize>> {
        visible_range(page_count, viewport_extent, scroll_offset, page_extent, self.config.overscan)
    }

    pub fn prefetch(&self, current_page_index: u32, page_count: u32) -> Vec<u32> {
        prefetch_page_indices(current_page_index, page_count, self.config.prefetch_radius)
    }

    /// Elements worth drawing this frame.
    pub fn cull<'a>(
        &mut self,
        elements: &'a [Element],
        viewport: &Rect,
        zoom_percent: f32,
    ) -> Vec<&'a Element> {
        let kept = cull(elements, viewport, zoom_percent, self.config.boundary);
        self.stats.culled += (elements.len() - kept.len()) as u64;
        kept
    }

    pub fn cached(&mut self, key: &RenderKey) -> Option<&V> {
        match self.cache.get(key) {
            Some(value) => {
                self.stats.cache_hits += 1;
                Some(value)
            }
            None => {
                self.stats.cache_misses += 1;
                None
            }
        }
    }

    pub fn store(&mut self, key: RenderKey, value: V) {
        self.stats.evictions += self.cache.insert(key, value) as u64;
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Clear the cache when the probe reports pressure above the threshold.
    /// Returns whether it was cleared. No reading means no pressure.
    pub fn check_memory(&mut self) -> bool {
        let Some(usage) = self.probe.usage() else {
            log::trace!("memory introspection unavailable");
            return false;
        };
        self.stats.last_usage = Some(usage);

        let ratio = usage.ratio();
        if ratio <= self.config.pressure_threshold {
            return false;
        }
        log::warn!(
            "memory pressure {ratio:.2} above {:.2}, dropping {} cached render(s)",
            self.config.pressure_threshold,
            self.cache.len()
        );
        self.cache.clear();
        self.stats.pressure_clears += 1;
        true
    }

    /// Trim the cache to half its capacity. Returns the number evicted.
    pub fn optimize(&mut self) -> usize {
        let evicted = self.cache.trim_to(self.cache.capacity() / 2);
        self.stats.sweeps += 1;
        self.stats.evictions += evicted as u64;
        if evicted > 0 {
            log::debug!("optimization sweep evicted {evicted} cached render(s)");
        }
        evicted
    }

    /// Run whichever periodic task is due. The first tick runs both.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        if is_due(self.last_memory_check, now, self.config.memory_check_interval) {
            self.last_memory_check = Some(now);
            report.memory_checked = true;
            report.cache_cleared = self.check_memory();
        }
        if is_due(self.last_sweep, now, self.config.optimize_interval) {
            self.last_sweep = Some(now);
            report.swept = true;
            report.evicted = self.optimize();
        }
        report
    }
}

impl<V> std::fmt::Debug for Governor<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Governor")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .field("stats", &self.stats)
            .finish()
    }
}

fn is_due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    match last {
        Some(last) => now.saturating_duration_since(last) >= interval,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedMemoryProbe;

    fn governor(capacity: usize) -> (Governor<&'static str>, FixedMemoryProbe) {
        let probe = FixedMemoryProbe::new(None);
        let config = GovernorConfig::default().with_cache_capacity(capacity);
        (Governor::new(config, Box::new(probe.clone())), probe)
    }

    fn fill(governor: &mut Governor<&'static str>, count: u32) {
        for page in 0..count {
            governor.store(RenderKey::new(page, 100), "render");
        }
    }

    #[test]
    fn pressure_above_threshold_clears_the_cache() {
        let (mut governor, probe) = governor(8);
        fill(&mut governor, 4);

        probe.set(Some(MemoryUsage::new(80, 100)));
        assert!(!governor.check_memory());
        assert_eq!(governor.cache_len(), 4);

        probe.set(Some(MemoryUsage::new(81, 100)));
        assert!(governor.check_memory());
        assert_eq!(governor.cache_len(), 0);
        assert_eq!(governor.stats().pressure_clears, 1);
    }

    #[test]
    fn missing_introspection_is_no_pressure() {
        let (mut governor, _probe) = governor(8);
        fill(&mut governor, 4);

        assert!(!governor.check_memory());
        assert_eq!(governor.cache_len(), 4);
    }

    #[test]
    fn tick_runs_tasks_on_their_intervals() {
        let (mut governor, _probe) = governor(8);
        fill(&mut governor, 8);
        let start = Instant::now();

        let first = governor.tick(start);
        assert!(first.memory_checked && first.swept);
        assert_eq!(first.evicted, 4);

        let soon = governor.tick(start + Duration::from_secs(10));
        assert_eq!(soon, TickReport::default());

        let later = governor.tick(start + Duration::from_secs(30));
        assert!(later.memory_checked);
        assert!(!later.swept);

        let sweep = governor.tick(start + Duration::from_secs(60));
        assert!(sweep.swept);
        assert_eq!(sweep.evicted, 0);
    }

    #[test]
    fn cache_lookups_are_counted() {
        let (mut governor, _probe) = governor(2);
        governor.store(RenderKey::new(0, 100), "page 0");

        assert_eq!(governor.cached(&RenderKey::new(0, 100)), Some(&"page 0"));
        assert_eq!(governor.cached(&RenderKey::new(0, 200)), None);

        governor.store(RenderKey::new(1, 100), "page 1");
        governor.store(RenderKey::new(2, 100), "page 2");

        let stats = governor.stats();
        assert_eq!((stats.cache_hits, stats.cache_misses, stats.evictions), (1, 1, 1));
    }

    #[test]
    fn cull_uses_the_configured_boundary() {
        use doc_model::{ElementKind, ShapeContent, ShapeKind};

        let touching = vec![Element::new(
            1,
            Rect::new(100.0, 0.0, 10.0, 10.0),
            ElementKind::Shape(ShapeContent::new(ShapeKind::Rectangle)),
        )];
        let viewport = Rect::new(0.0, 0.0, 100.0, 100.0);

        let (mut inclusive, _probe) = governor(2);
        assert_eq!(inclusive.cull(&touching, &viewport, 100.0).len(), 1);

        let mut exclusive: Governor<&'static str> = Governor::new(
            GovernorConfig::default().with_boundary(Boundary::Exclusive),
            Box::new(FixedMemoryProbe::new(None)),
        );
        assert!(exclusive.cull(&touching, &viewport, 100.0).is_empty());
        assert_eq!(exclusive.stats().culled, 1);
    }
}
