#![no_main]
use libfuzzer_sys::fuzz_target;

use rtc_rtcp::traverser::{TraverseItem, Traverser};

fuzz_target!(|data: &[u8]| {
    let mut traverser = Traverser::new(data);
    if traverser.parse().is_err() {
        return;
    }
    for item in traverser.iter() {
        if let TraverseItem::ExtendedReport(xr) = item {
            for _ in xr.iter() {}
        }
    }
});
