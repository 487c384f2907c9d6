use std::sync::{Arc, Mutex};

use super::*;

#[derive(Clone, Default)]
struct Shared(Arc<Mutex<Vec<u8>>>);

impl Write for Shared {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Shared {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[test]
fn writes_status_then_progress() {
    let buf = Shared::default();
    let p = ProgressReporter::new(buf.clone());
    p.report(5, "Parsing FIT data...");
    assert_eq!(buf.lines(), ["STATUS:Parsing FIT data...", "PROGRESS:5"]);
}

#[test]
fn percentages_never_decrease() {
    let buf = Shared::default();
    let p = ProgressReporter::new(buf.clone());
    p.progress(40);
    p.progress(20);
    p.heartbeat();
    p.progress(250);
    assert_eq!(
        buf.lines(),
        ["PROGRESS:40", "PROGRESS:40", "PROGRESS:40", "PROGRESS:100"]
    );
    assert_eq!(p.last(), 100);
}

#[test]
fn multi_line_status_stays_on_one_line() {
    let buf = Shared::default();
    let p = ProgressReporter::new(buf.clone());
    p.status("a\nb");
    assert_eq!(buf.lines(), ["STATUS:a b"]);
}

#[test]
fn bands_partition_the_range() {
    assert_eq!(PhaseBand::RENDER.at(0.0), 15);
    assert_eq!(PhaseBand::RENDER.at(1.0), 75);
    assert_eq!(PhaseBand::RENDER.step(1, 2), 45);
    assert_eq!(PhaseBand::RENDER.at(f64::NAN), 15);
    assert_eq!(PhaseBand::MERGE.step(0, 0), 85);
    assert_eq!(PhaseBand::COMPOSE.at(2.0), 100);
    assert!(PhaseBand::INGEST.end <= PhaseBand::RENDER.start);
}

#[test]
fn stale_chunk_reports_are_dropped_whole() {
    let buf = Shared::default();
    let p = ProgressReporter::new(buf.clone());
    assert!(p.report_advance(55, "Rendered chunk 2/3"));
    assert!(!p.report_advance(35, "Rendered chunk 1/3"));
    assert!(!p.report_advance(55, "Rendered chunk 2/3"));
    assert!(p.report_advance(75, "Rendered chunk 3/3"));
    assert_eq!(
        buf.lines(),
        [
            "STATUS:Rendered chunk 2/3",
            "PROGRESS:55",
            "STATUS:Rendered chunk 3/3",
            "PROGRESS:75",
        ]
    );
}
