use doc_model::{Element, ElementKind, Rect, ShapeContent, ShapeKind};
use std::time::{Duration, Instant};
use viewer_core::{FixedMemoryProbe, Governor, GovernorConfig, MemoryUsage, RenderKey};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn scrolling_a_long_document_keeps_the_cache_bounded() {
    init_logging();
    let probe = FixedMemoryProbe::new(Some(MemoryUsage::new(10, 100)));
    let mut governor: Governor<u32> =
        Governor::new(GovernorConfig::default().with_cache_capacity(6), Box::new(probe.clone()));
    let page_extent = 800.0;

    for step in 0..50 {
        let scroll = step as f32 * 400.0;
        let visible = governor.visible_pages(200, 1000.0, scroll, page_extent).expect("pages in view");
        for index in visible {
            let key = RenderKey::new(index as u32, 100);
            if governor.cached(&key).is_none() {
                governor.store(key, index as u32);
            }
        }
        assert!(governor.cache_len() <= 6);
    }
    assert!(governor.stats().evictions > 0);
    assert!(governor.stats().cache_hits > 0);
}

#[test]
fn pressure_on_a_later_tick_drops_every_render() {
    init_logging();
    let probe = FixedMemoryProbe::new(Some(MemoryUsage::new(10, 100)));
    let mut governor: Governor<u32> = Governor::new(
        GovernorConfig::default()
            .with_cache_capacity(8)
            .with_intervals(Duration::from_secs(5), Duration::from_secs(3600)),
        Box::new(probe.clone()),
    );
    let start = Instant::now();
    governor.tick(start);

    for page in 0..4 {
        governor.store(RenderKey::new(page, 100), page);
    }
    probe.set(Some(MemoryUsage::new(95, 100)));

    assert!(!governor.tick(start + Duration::from_secs(1)).memory_checked);
    assert_eq!(governor.cache_len(), 4);

    let report = governor.tick(start + Duration::from_secs(5));
    assert!(report.cache_cleared);
    assert_eq!(governor.cache_len(), 0);
}

#[test]
fn culling_follows_zoom() {
    init_logging();
    let mut governor: Governor<u32> =
        Governor::new(GovernorConfig::default(), Box::new(FixedMemoryProbe::new(None)));
    let elements: Vec<Element> = (0..10)
        .map(|i| {
            Element::new(
                1,
                Rect::new(i as f32 * 100.0, 0.0, 50.0, 50.0),
                ElementKind::Shape(ShapeContent::new(ShapeKind::Circle)),
            )
        })
        .collect();
    let viewport = Rect::new(0.0, 0.0, 300.0, 300.0);

    // Left edges at 0, 100, 200, 300 intersect or touch the viewport
    assert_eq!(governor.cull(&elements, &viewport, 100.0).len(), 4);
    // At 50% the left edges run 0, 50, .., 450 and seven reach the viewport
    assert_eq!(governor.cull(&elements, &viewport, 50.0).len(), 7);
}
