use super::evolution_engine::{BarSummary, ProgressCallback};
use super::policy::CycleReport;
use crate::types::Bar;

/// Reports progress through `log`, one line every `report_every` bars
pub struct ConsoleProgressCallback {
    report_every: usize,
}

impl ConsoleProgressCallback {
    pub fn new(report_every: usize) -> Self {
        Self {
            report_every: report_every.max(1),
        }
    }
}

impl Default for ConsoleProgressCallback {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ProgressCallback for ConsoleProgressCallback {
    fn on_bar_start(&mut self, bar: Bar) {
        log::trace!("Bar {} starting", bar);
    }

    fn on_bar_complete(&mut self, bar: Bar, summary: &BarSummary) {
        if (bar + 1) % self.report_every != 0 {
            return;
        }
        let votes: Vec<String> = summary
            .votes
            .iter()
            .map(|v| format!("{}={}", v.dataset, v.signal))
            .collect();
        log::info!(
            "Bar {} complete. Votes: [{}], budget exhausted: {}",
            bar,
            votes.join(", "),
            summary.budget_exhausted
        );
    }

    fn on_cycle_complete(&mut self, bar: Bar, report: &CycleReport) {
        if report.bred.starved > 0 {
            log::warn!("Bar {}: {} breeding slots unfilled", bar, report.bred.starved);
        }
    }
}

// For handing progress to another thread
pub struct ChannelProgressCallback {
    sender: std::sync::mpsc::Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    BarStart(Bar),
    BarComplete(BarSummary),
    CycleComplete { bar: Bar, report: CycleReport },
}

impl ChannelProgressCallback {
    pub fn new(sender: std::sync::mpsc::Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_bar_start(&mut self, bar: Bar) {
        let _ = self.sender.send(ProgressMessage::BarStart(bar));
    }

    fn on_bar_complete(&mut self, _bar: Bar, summary: &BarSummary) {
        let _ = self.sender.send(ProgressMessage::BarComplete(summary.clone()));
    }

    fn on_cycle_complete(&mut self, bar: Bar, report: &CycleReport) {
        let _ = self.sender.send(ProgressMessage::CycleComplete {
            bar,
            report: report.clone(),
        });
    }
}
