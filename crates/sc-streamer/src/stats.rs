use std::time::Instant;

#[derive(Debug)]
pub struct StatsCollector {
    pub frames_updated: u64,
    pub ticks_unchanged: u64,
    pub recoveries: u64,
    start_time: Instant,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            frames_updated: 0,
            ticks_unchanged: 0,
            recoveries: 0,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn average_fps(&self) -> f64 {
        let uptime = self.start_time.elapsed().as_secs_f64();
        if uptime > 0.0 {
            self.frames_updated as f64 / uptime
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_collector_is_zeroed() {
        let stats = StatsCollector::new();
        assert_eq!(stats.frames_updated, 0);
        assert_eq!(stats.ticks_unchanged, 0);
        assert_eq!(stats.recoveries, 0);
    }

    #[test]
    fn test_average_fps_counts_updates() {
        let mut stats = StatsCollector::new();
        stats.frames_updated = 100;
        assert!(stats.average_fps() > 0.0);
    }
}
