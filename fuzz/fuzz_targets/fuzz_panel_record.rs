#![no_main]

use gutter_layout::model::{Panel, PanelRecord};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Persisted records may carry strings, numbers or junk in any bound;
    // parsing must never panic and every bound must come out finite.
    let Ok(record) = serde_json::from_slice::<PanelRecord>(data) else {
        return;
    };
    let panel = Panel::from(record);
    assert!(panel.rect.is_finite(), "lenient parse produced {:?}", panel.rect);
    assert!(panel.rotation.is_finite());
    assert!(panel.skew_x.is_finite() && panel.skew_y.is_finite());
});
