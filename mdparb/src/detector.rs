//! Packet loss detector: the single poll loop driving every channel.
//!
//! Each feed socket gets a receive task that forwards datagrams into one
//! queue. The loop owns every [`ChannelMonitor`], so no arbitration state is
//! shared between tasks. Besides datagrams it wakes on three timers and a
//! command queue:
//!
//! - the poll interval, running the stale-gap sweep and idle check on every
//!   channel so loss is reported even when both lines go silent
//! - the report interval, logging the statistics table
//! - [`DetectorHandle`] commands (report, reset, shutdown)

use crate::error::DetectorError;
use mdparb_arbitration::{
    ArbitrationConfig, ChannelMonitor, ChannelStats, FeedSink, LoggingSink, StatsReport,
};
use mdparb_config::{ChannelFeeds, CmeConfig};
use mdparb_core::Line;
use mdparb_transport::{Datagram, FeedReceiver, MulticastConfig, MulticastSocket};
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

/// Runtime settings of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectorConfig {
    /// Interface used to join groups.
    pub interface: Ipv4Addr,
    /// Per-channel arbitration settings.
    pub arbitration: ArbitrationConfig,
    /// Sweep and idle check period.
    pub poll_interval: Duration,
    /// Statistics report period.
    pub report_interval: Duration,
    /// Time after joining during which datagrams are discarded.
    pub warmup: Duration,
    /// Time without progress after which a channel is reported idle.
    pub idle_threshold: Duration,
    /// Requested kernel receive buffer per socket.
    pub recv_buffer_size: usize,
    /// Largest datagram read from a feed.
    pub max_datagram_size: usize,
    /// Capacity of the datagram queue between receive tasks and the loop.
    pub queue_capacity: usize,
    /// Log per-line gaps at `info`.
    pub packet_logging: bool,
    /// Zero all counters after each report.
    pub reset_after_report: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            interface: Ipv4Addr::UNSPECIFIED,
            arbitration: ArbitrationConfig::default(),
            poll_interval: Duration::from_millis(100),
            report_interval: Duration::from_secs(5),
            warmup: Duration::from_secs(1),
            idle_threshold: Duration::from_secs(30),
            recv_buffer_size: mdparb_transport::multicast::DEFAULT_RECV_BUFFER_SIZE,
            max_datagram_size: mdparb_transport::receiver::DEFAULT_MAX_DATAGRAM_SIZE,
            queue_capacity: 65_536,
            packet_logging: false,
            reset_after_report: false,
        }
    }
}

impl DetectorConfig {
    /// Creates a config joining groups on `interface`.
    #[must_use]
    pub fn new(interface: Ipv4Addr) -> Self {
        Self {
            interface,
            ..Default::default()
        }
    }

    /// Sets the arbitration settings.
    #[must_use]
    pub fn arbitration(mut self, arbitration: ArbitrationConfig) -> Self {
        self.arbitration = arbitration;
        self
    }

    /// Sets the poll interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the report interval.
    #[must_use]
    pub fn report_interval(mut self, interval: Duration) -> Self {
        self.report_interval = interval;
        self
    }

    /// Sets the warm-up duration.
    #[must_use]
    pub fn warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Sets the idle threshold.
    #[must_use]
    pub fn idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    /// Sets the requested receive buffer size.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Sets the largest datagram read.
    #[must_use]
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size;
        self
    }

    /// Sets the datagram queue capacity.
    #[must_use]
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Enables per-line gap logging at `info`.
    #[must_use]
    pub fn packet_logging(mut self, enabled: bool) -> Self {
        self.packet_logging = enabled;
        self
    }

    /// Enables counter reset after each report.
    #[must_use]
    pub fn reset_after_report(mut self, enabled: bool) -> Self {
        self.reset_after_report = enabled;
        self
    }
}

/// Commands accepted by a running detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorCommand {
    /// Log a report now.
    Report,
    /// Zero all counters.
    ResetStatistics,
    /// Stop the loop.
    Shutdown,
}

/// Handle for controlling the detector from outside the loop.
#[derive(Debug, Clone)]
pub struct DetectorHandle {
    cmd_tx: mpsc::Sender<DetectorCommand>,
}

impl DetectorHandle {
    /// Requests a report.
    pub fn report(&self) {
        let _ = self.cmd_tx.try_send(DetectorCommand::Report);
    }

    /// Requests a counter reset.
    pub fn reset_statistics(&self) {
        let _ = self.cmd_tx.try_send(DetectorCommand::ResetStatistics);
    }

    /// Requests shutdown; the loop stops after the current event.
    pub fn shutdown(&self) {
        let _ = self.cmd_tx.try_send(DetectorCommand::Shutdown);
    }
}

/// Monitors the incremental A/B feeds of a set of channels.
///
/// The loop also stops once every [`DetectorHandle`] is dropped.
pub struct PacketLossDetector<S = LoggingSink> {
    config: DetectorConfig,
    feeds: Vec<ChannelFeeds>,
    monitors: Vec<ChannelMonitor>,
    index: HashMap<u32, usize>,
    sink: S,
    cmd_rx: mpsc::Receiver<DetectorCommand>,
}

impl<S: FeedSink> PacketLossDetector<S> {
    /// Creates a detector for `channels`, resolving their feeds in `cme`.
    ///
    /// # Errors
    /// Returns `DetectorError` if no channels are given, an interval or size
    /// is zero, a channel is listed twice, its feeds cannot be resolved, or
    /// the arbitration settings are invalid.
    pub fn new(
        config: DetectorConfig,
        cme: &CmeConfig,
        channels: &[u32],
        sink: S,
    ) -> Result<(Self, DetectorHandle), DetectorError> {
        if channels.is_empty() {
            return Err(DetectorError::NoChannels);
        }
        if config.poll_interval.is_zero() || config.report_interval.is_zero() {
            return Err(DetectorError::invalid_config("intervals must be non-zero"));
        }
        if config.queue_capacity == 0 || config.max_datagram_size == 0 {
            return Err(DetectorError::invalid_config(
                "queue capacity and datagram size must be non-zero",
            ));
        }

        let mut feeds = Vec::with_capacity(channels.len());
        let mut monitors = Vec::with_capacity(channels.len());
        let mut index = HashMap::with_capacity(channels.len());

        for &channel in channels {
            if index.insert(channel, monitors.len()).is_some() {
                return Err(DetectorError::DuplicateChannel { channel });
            }
            let incremental = cme.incremental_feeds(channel)?;
            tracing::info!(
                channel,
                label = %incremental.label,
                feed_a = %incremental.feed_a,
                feed_b = %incremental.feed_b,
                "monitoring channel"
            );
            if let Ok(instrument) = cme.instrument_feeds(channel) {
                tracing::debug!(channel, feed_a = %instrument.feed_a, feed_b = %instrument.feed_b, "instrument definition feeds");
            }
            if let Ok(snapshot) = cme.snapshot_feeds(channel) {
                tracing::debug!(channel, feed_a = %snapshot.feed_a, feed_b = %snapshot.feed_b, "snapshot feeds");
            }

            monitors.push(
                ChannelMonitor::new(channel, config.arbitration)?
                    .with_packet_logging(config.packet_logging),
            );
            feeds.push(incremental);
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let detector = Self {
            config,
            feeds,
            monitors,
            index,
            sink,
            cmd_rx,
        };
        Ok((detector, DetectorHandle { cmd_tx }))
    }

    /// Joins every feed, runs the loop until shutdown, then leaves the groups.
    ///
    /// # Errors
    /// Returns `DetectorError::Transport` if a socket cannot be opened or a
    /// group cannot be joined. Groups already joined are left first.
    pub async fn run(&mut self) -> Result<(), DetectorError> {
        let sockets = self.join_all()?;

        let (tx, rx) = mpsc::channel(self.config.queue_capacity);
        let tasks: Vec<_> = sockets
            .iter()
            .map(|(channel, line, socket)| {
                FeedReceiver::new(Arc::clone(socket), *channel, *line)
                    .max_datagram_size(self.config.max_datagram_size)
                    .spawn(tx.clone())
            })
            .collect();
        drop(tx);

        self.run_with(rx).await;

        for task in &tasks {
            task.abort();
        }
        leave_all(&sockets);
        Ok(())
    }

    fn join_all(&self) -> Result<Vec<(u32, Line, Arc<MulticastSocket>)>, DetectorError> {
        let multicast = MulticastConfig::new(self.config.interface)
            .recv_buffer_size(self.config.recv_buffer_size);
        let mut sockets = Vec::with_capacity(self.feeds.len() * 2);

        for feeds in &self.feeds {
            for line in Line::ALL {
                match MulticastSocket::join(feeds.endpoint(line), &multicast) {
                    Ok(socket) => sockets.push((feeds.channel_id, line, Arc::new(socket))),
                    Err(e) => {
                        leave_all(&sockets);
                        return Err(e.into());
                    }
                }
            }
        }
        Ok(sockets)
    }

    /// Runs warm-up and the poll loop over an existing datagram queue.
    ///
    /// Returns on shutdown, or once the queue is closed and drained.
    pub async fn run_with(&mut self, mut rx: mpsc::Receiver<Datagram>) {
        if !self.warm_up(&mut rx).await {
            return;
        }

        let mut sweep = tokio::time::interval(self.config.poll_interval);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut report = tokio::time::interval_at(
            tokio::time::Instant::now() + self.config.report_interval,
            self.config.report_interval,
        );
        report.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                datagram = rx.recv() => match datagram {
                    Some(datagram) => self.process_datagram(datagram),
                    None => {
                        tracing::info!("all feed receivers stopped");
                        break;
                    }
                },
                _ = sweep.tick() => {
                    self.drain_queued(&mut rx);
                    self.sweep_all(Instant::now());
                }
                _ = report.tick() => {
                    self.report();
                }
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(DetectorCommand::Report) => {
                        self.report();
                    }
                    Some(DetectorCommand::ResetStatistics) => self.reset_statistics(),
                    Some(DetectorCommand::Shutdown) | None => {
                        tracing::info!("detector shutdown requested");
                        break;
                    }
                },
            }
        }

        self.report();
    }

    /// Discards datagrams for the warm-up period.
    ///
    /// Returns false if shutdown was requested meanwhile.
    async fn warm_up(&mut self, rx: &mut mpsc::Receiver<Datagram>) -> bool {
        if self.config.warmup.is_zero() {
            return true;
        }
        tracing::info!(warmup_ms = self.config.warmup.as_millis() as u64, "warming up");

        let deadline = tokio::time::sleep(self.config.warmup);
        tokio::pin!(deadline);
        let mut discarded = 0u64;

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                datagram = rx.recv() => match datagram {
                    Some(_) => discarded += 1,
                    None => break,
                },
                cmd = self.cmd_rx.recv() => match cmd {
                    Some(DetectorCommand::Report) => {
                        self.report();
                    }
                    Some(DetectorCommand::ResetStatistics) => self.reset_statistics(),
                    Some(DetectorCommand::Shutdown) | None => {
                        tracing::info!("detector shutdown requested during warm-up");
                        return false;
                    }
                },
            }
        }

        tracing::info!(discarded, "warm-up complete");
        true
    }

    /// Processes the datagrams already queued, so a sweep never abandons a
    /// gap whose filler is waiting in the queue. Bounded by the queue length
    /// at entry.
    fn drain_queued(&mut self, rx: &mut mpsc::Receiver<Datagram>) {
        for _ in 0..rx.len() {
            match rx.try_recv() {
                Ok(datagram) => self.process_datagram(datagram),
                Err(_) => break,
            }
        }
    }

    /// Feeds one datagram into its channel's monitor and delivers the result.
    pub fn process_datagram(&mut self, datagram: Datagram) {
        let Some(&slot) = self.index.get(&datagram.channel_id) else {
            tracing::warn!(channel = datagram.channel_id, "datagram for unknown channel");
            return;
        };
        let monitor = &mut self.monitors[slot];
        if let Some(outcome) =
            monitor.on_datagram(datagram.line, datagram.payload, datagram.received_at)
        {
            self.sink.deliver(datagram.channel_id, &outcome.events);
        }
    }

    /// Sweeps every channel for stale gaps and checks for idle channels.
    pub fn sweep_all(&mut self, now: Instant) {
        for monitor in &mut self.monitors {
            let outcome = monitor.sweep_at(now);
            if !outcome.events.is_empty() {
                self.sink.deliver(monitor.channel_id(), &outcome.events);
            }
            monitor.check_idle(now, self.config.idle_threshold);
        }
    }

    /// Logs the statistics table and returns it.
    ///
    /// Counters are zeroed afterwards when `reset_after_report` is set.
    pub fn report(&mut self) -> StatsReport {
        let report = StatsReport::new(self.snapshots());
        for line in report.lines() {
            tracing::info!("{}", line);
        }
        if self.config.reset_after_report {
            self.reset_statistics();
        }
        report
    }

    /// Zeroes all counters; cursors and caches are kept.
    pub fn reset_statistics(&mut self) {
        self.monitors.iter_mut().for_each(ChannelMonitor::reset);
        tracing::debug!("statistics reset");
    }

    /// Returns a snapshot per channel, in channel list order.
    #[must_use]
    pub fn snapshots(&self) -> Vec<ChannelStats> {
        self.monitors.iter().map(ChannelMonitor::snapshot).collect()
    }

    /// Returns the monitors.
    #[must_use]
    pub fn monitors(&self) -> &[ChannelMonitor] {
        &self.monitors
    }

    /// Returns the resolved incremental feeds.
    #[must_use]
    pub fn feeds(&self) -> &[ChannelFeeds] {
        &self.feeds
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Returns the sink.
    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes the detector and returns the sink.
    pub fn into_sink(self) -> S {
        self.sink
    }
}

fn leave_all(sockets: &[(u32, Line, Arc<MulticastSocket>)]) {
    for (channel, line, socket) in sockets {
        if let Err(e) = socket.leave() {
            tracing::warn!(channel, %line, "failed to leave group: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use mdparb_arbitration::{ChannelEvent, NullSink};
    use mdparb_config::{ConfigError, parse_config};
    use mdparb_core::{FeedEvent, PacketHeader, PacketLoss};

    const CONFIG: &str = r#"<configuration>
  <channel id="310" label="Equity Futures">
    <connections>
      <connection id="310IA"><ip>224.0.31.1</ip><port>14310</port></connection>
      <connection id="310IB"><ip>224.0.32.1</ip><port>15310</port></connection>
    </connections>
  </channel>
  <channel id="312" label="Equity Options">
    <connections>
      <connection id="312IA"><ip>224.0.31.3</ip><port>14312</port></connection>
      <connection id="312IB"><ip>224.0.32.3</ip><port>15312</port></connection>
    </connections>
  </channel>
</configuration>"#;

    type TestDetector = PacketLossDetector<Vec<ChannelEvent>>;

    fn detector(config: DetectorConfig) -> (TestDetector, DetectorHandle) {
        let cme = parse_config(CONFIG).unwrap();
        PacketLossDetector::new(config, &cme, &[310, 312], Vec::new()).unwrap()
    }

    fn datagram(channel_id: u32, line: Line, seq: u32, at: Instant) -> Datagram {
        let mut buf = vec![0u8; PacketHeader::ENCODED_LENGTH + 1];
        PacketHeader::encode(seq, &mut buf);
        buf[PacketHeader::ENCODED_LENGTH] = seq as u8;
        Datagram {
            channel_id,
            line,
            payload: Bytes::from(buf),
            received_at: at,
        }
    }

    fn sequences(events: &[ChannelEvent], channel_id: u32) -> Vec<u64> {
        events
            .iter()
            .filter(|e| e.channel_id == channel_id)
            .filter_map(|e| e.event.as_packet())
            .map(|p| p.sequence)
            .collect()
    }

    #[test]
    fn test_new_validates_channels() {
        let cme = parse_config(CONFIG).unwrap();
        let config = DetectorConfig::default();

        let err = PacketLossDetector::new(config, &cme, &[], NullSink).err().unwrap();
        assert!(matches!(err, DetectorError::NoChannels));

        let err = PacketLossDetector::new(config, &cme, &[310, 310], NullSink)
            .err()
            .unwrap();
        assert!(matches!(err, DetectorError::DuplicateChannel { channel: 310 }));

        let err = PacketLossDetector::new(config, &cme, &[999], NullSink)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            DetectorError::Config(ConfigError::ChannelNotFound { channel: 999 })
        ));

        let zero = config.report_interval(Duration::ZERO);
        let err = PacketLossDetector::new(zero, &cme, &[310], NullSink)
            .err()
            .unwrap();
        assert!(matches!(err, DetectorError::InvalidConfig { .. }));

        let bad = config.arbitration(ArbitrationConfig::new().cache_capacity(0));
        let err = PacketLossDetector::new(bad, &cme, &[310], NullSink)
            .err()
            .unwrap();
        assert!(matches!(err, DetectorError::Arbitration(_)));
    }

    #[test]
    fn test_feeds_resolved_in_channel_order() {
        let (detector, _handle) = detector(DetectorConfig::default());
        let feeds = detector.feeds();
        assert_eq!(feeds.len(), 2);
        assert_eq!(feeds[0].feed_a.to_string(), "224.0.31.1:14310");
        assert_eq!(feeds[1].endpoint(Line::B).to_string(), "224.0.32.3:15312");
    }

    #[test]
    fn test_channels_arbitrated_independently() {
        let (mut detector, _handle) = detector(DetectorConfig::default());
        let now = Instant::now();

        detector.process_datagram(datagram(310, Line::A, 1, now));
        detector.process_datagram(datagram(312, Line::B, 50, now));
        detector.process_datagram(datagram(310, Line::B, 1, now));
        detector.process_datagram(datagram(310, Line::B, 2, now));
        detector.process_datagram(datagram(312, Line::A, 50, now));
        detector.process_datagram(datagram(312, Line::A, 51, now));
        detector.process_datagram(datagram(999, Line::A, 1, now));

        assert_eq!(sequences(detector.sink(), 310), vec![1, 2]);
        assert_eq!(sequences(detector.sink(), 312), vec![50, 51]);

        let snapshots = detector.snapshots();
        assert_eq!(snapshots[0].channel_id, 310);
        assert_eq!(snapshots[0].feed_b.received, 2);
        assert_eq!(snapshots[1].combined.received, 2);
    }

    #[test]
    fn test_sweep_reports_outage_to_sink() {
        let (mut detector, _handle) = detector(DetectorConfig::default());
        let now = Instant::now();
        detector.process_datagram(datagram(310, Line::A, 1, now));
        detector.process_datagram(datagram(310, Line::A, 5, now));

        detector.sweep_all(now + Duration::from_millis(50));
        assert_eq!(detector.sink().len(), 1);

        detector.sweep_all(now + Duration::from_millis(200));
        let events: Vec<&FeedEvent> = detector.sink().iter().map(|e| &e.event).collect();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].as_loss(), Some(PacketLoss::new(2, 3)));
        assert_eq!(events[2].as_packet().map(|p| p.sequence), Some(5));
    }

    #[test]
    fn test_runt_datagram_counted_not_delivered() {
        let (mut detector, _handle) = detector(DetectorConfig::default());
        detector.process_datagram(Datagram {
            channel_id: 312,
            line: Line::A,
            payload: Bytes::from_static(&[0, 1]),
            received_at: Instant::now(),
        });
        assert!(detector.sink().is_empty());
        assert_eq!(detector.snapshots()[1].runts, 1);
    }

    #[test]
    fn test_report_and_reset() {
        let config = DetectorConfig::default().reset_after_report(true);
        let (mut detector, _handle) = detector(config);
        let now = Instant::now();
        detector.process_datagram(datagram(310, Line::A, 1, now));
        detector.process_datagram(datagram(310, Line::A, 3, now));

        let report = detector.report();
        assert_eq!(report.rows().len(), 2);
        assert_eq!(report.total().feed_a.received, 2);
        assert_eq!(report.total().feed_a.missed, 1);
        assert!(report.lines()[1].starts_with("Channel 310"));

        // Counters were reset, the cursor was not.
        assert_eq!(detector.snapshots()[0].feed_a.received, 0);
        assert_eq!(
            detector.monitors()[0].engine().expected_sequence(),
            Some(2)
        );
    }

    #[tokio::test]
    async fn test_run_with_drains_queue() {
        let config = DetectorConfig::default().warmup(Duration::ZERO);
        let (mut detector, _handle) = detector(config);
        let (tx, rx) = mpsc::channel(16);

        let now = Instant::now();
        for seq in [1, 3, 2] {
            tx.send(datagram(310, Line::A, seq, now)).await.unwrap();
        }
        tx.send(datagram(310, Line::B, 4, now)).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), detector.run_with(rx))
            .await
            .unwrap();
        assert_eq!(sequences(detector.sink(), 310), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_warm_up_discards_datagrams() {
        let config = DetectorConfig::default().warmup(Duration::from_millis(20));
        let (mut detector, _handle) = detector(config);
        let (tx, rx) = mpsc::channel(16);
        tx.send(datagram(310, Line::A, 1, Instant::now())).await.unwrap();
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), detector.run_with(rx))
            .await
            .unwrap();
        assert!(detector.sink().is_empty());
        assert_eq!(detector.snapshots()[0].feed_a.received, 0);
    }

    #[tokio::test]
    async fn test_sweep_tick_processes_queued_filler_first() {
        for _ in 0..20 {
            let config = DetectorConfig::default().warmup(Duration::ZERO);
            let (mut detector, _handle) = detector(config);
            let (tx, rx) = mpsc::channel(16);

            // The gap opened long enough ago that a wall-clock sweep would
            // abandon it; its filler is already queued.
            let opened = Instant::now()
                .checked_sub(Duration::from_millis(200))
                .unwrap();
            detector.process_datagram(datagram(310, Line::A, 1, opened));
            detector.process_datagram(datagram(310, Line::A, 3, opened));
            let filled = opened + Duration::from_millis(5);
            tx.send(datagram(310, Line::B, 2, filled)).await.unwrap();
            drop(tx);

            tokio::time::timeout(Duration::from_secs(5), detector.run_with(rx))
                .await
                .unwrap();

            assert!(detector.sink().iter().all(|e| e.event.as_loss().is_none()));
            assert_eq!(sequences(detector.sink(), 310), vec![1, 2, 3]);
            assert_eq!(detector.snapshots()[0].combined.missed, 0);
        }
    }

    #[tokio::test]
    async fn test_commands_during_warm_up_are_applied() {
        let config = DetectorConfig::default().warmup(Duration::from_millis(20));
        let (mut detector, handle) = detector(config);
        let (tx, rx) = mpsc::channel(16);

        detector.process_datagram(datagram(310, Line::A, 1, Instant::now()));
        handle.report();
        handle.reset_statistics();

        let feed = async move {
            tokio::time::sleep(Duration::from_millis(60)).await;
            tx.send(datagram(310, Line::A, 2, Instant::now())).await.unwrap();
        };
        let (_, ()) = tokio::time::timeout(
            Duration::from_secs(5),
            async { tokio::join!(detector.run_with(rx), feed) },
        )
        .await
        .unwrap();

        // The reset landed before the post warm-up datagram was counted.
        let stats = &detector.snapshots()[0];
        assert_eq!(stats.feed_a.received, 1);
        assert_eq!(stats.combined.received, 1);
        assert_eq!(sequences(detector.sink(), 310), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_handle_shutdown_stops_loop() {
        let config = DetectorConfig::default().warmup(Duration::ZERO);
        let (mut detector, handle) = detector(config);
        let (tx, rx) = mpsc::channel(16);

        handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), detector.run_with(rx))
            .await
            .unwrap();
        drop(tx);
        assert!(detector.sink().is_empty());
    }
}
