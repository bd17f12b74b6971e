//! Periodic update loop.
//!
//! The scheduler alternates between two phases: [`Phase::Idle`] while waiting
//! on its [`Timer`], and [`Phase::Running`] while it executes one tick. The
//! phase is published on a watch channel, see [`Scheduler::watch_phase`]. A
//! tick runs the IPv4 job and then the IPv6 job; a failing job is logged and
//! never stops the loop.

use crate::config::MAX_PERIOD;
use crate::error::Result;
use crate::providers::DnsProvider;
use crate::record::{AddressFamily, DiscoveredRecords, ManagedRecord};
use crate::resolver::IpResolver;
use crate::state::TrackingState;
use crate::updater::{JobOutcome, UpdateJob};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Something the scheduler can block on between ticks.
#[async_trait]
pub trait Timer: Send {
    /// Wait until the next tick is due.
    async fn wait(&mut self);
}

/// Fixed-period timer whose first tick is one full period after creation.
///
/// Periods longer than [`MAX_PERIOD`] are capped.
pub struct IntervalTimer {
    interval: Interval,
}

impl IntervalTimer {
    pub fn new(period: Duration) -> Self {
        let period = period.min(MAX_PERIOD);
        let now = Instant::now();
        let start = now.checked_add(period).unwrap_or(now);
        let mut interval = tokio::time::interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}

#[async_trait]
impl Timer for IntervalTimer {
    async fn wait(&mut self) {
        self.interval.tick().await;
    }
}

/// Scheduler phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
}

/// Records of one family together with the resolver for that family.
pub struct FamilyTarget {
    pub records: Vec<ManagedRecord>,
    pub resolver: Box<dyn IpResolver>,
}

impl FamilyTarget {
    pub fn family(&self) -> AddressFamily {
        self.resolver.family()
    }
}

/// Result of one job within a tick.
#[derive(Debug)]
pub struct JobReport {
    pub family: AddressFamily,
    pub result: Result<JobOutcome>,
}

/// Result of one tick, in execution order.
#[derive(Debug, Default)]
pub struct TickReport {
    pub jobs: Vec<JobReport>,
}

impl TickReport {
    pub fn get(&self, family: AddressFamily) -> Option<&Result<JobOutcome>> {
        self.jobs
            .iter()
            .find(|job| job.family == family)
            .map(|job| &job.result)
    }

    /// Number of jobs that failed.
    pub fn failures(&self) -> usize {
        self.jobs.iter().filter(|job| job.result.is_err()).count()
    }
}

/// Drives update jobs on every timer tick.
pub struct Scheduler {
    provider: Box<dyn DnsProvider>,
    domain: String,
    hostname: String,
    targets: Vec<FamilyTarget>,
    state: TrackingState,
    phase: watch::Sender<Phase>,
}

impl Scheduler {
    /// Create a scheduler for the records of `domain` named `hostname`.
    ///
    /// Each resolver adds a job for its family, fed with the matching
    /// discovered records.
    pub fn new(
        provider: Box<dyn DnsProvider>,
        domain: impl Into<String>,
        hostname: impl Into<String>,
        records: &DiscoveredRecords,
        resolvers: Vec<Box<dyn IpResolver>>,
    ) -> Self {
        let mut targets: Vec<FamilyTarget> = resolvers
            .into_iter()
            .map(|resolver| FamilyTarget {
                records: records.get(resolver.family()).to_vec(),
                resolver,
            })
            .collect();
        targets.sort_by_key(FamilyTarget::family);

        Self {
            provider,
            domain: domain.into(),
            hostname: hostname.into(),
            targets,
            state: TrackingState::new(),
            phase: watch::channel(Phase::Idle).0,
        }
    }

    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Subscribe to phase changes. The receiver outlives `run` consuming the
    /// scheduler, so callers can still see whether a tick was in flight.
    pub fn watch_phase(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn targets(&self) -> &[FamilyTarget] {
        &self.targets
    }

    /// Run every family's job once, in family order.
    pub async fn tick(&mut self) -> TickReport {
        self.phase.send_replace(Phase::Running);
        let mut report = TickReport::default();

        for target in &self.targets {
            let family = target.family();
            let job = UpdateJob {
                family,
                records: &target.records,
                domain: &self.domain,
                hostname: &self.hostname,
                resolver: target.resolver.as_ref(),
            };

            let result = job.run(self.provider.as_ref(), &mut self.state).await;
            if let Err(e) = &result {
                tracing::error!(
                    "{} update of {} records via {} failed: {}",
                    family,
                    self.provider.name(),
                    target.resolver.endpoint(),
                    e
                );
            }
            report.jobs.push(JobReport { family, result });
        }

        self.phase.send_replace(Phase::Idle);
        report
    }

    /// Tick every time `timer` fires. Never returns.
    pub async fn run<T: Timer>(mut self, mut timer: T) {
        loop {
            timer.wait().await;
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DdnsError;
    use crate::providers::MockDnsProvider;
    use crate::resolver::MockIpResolver;
    use mockall::predicate::{always, eq};
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn discovered(v4: &[u64], v6: &[u64]) -> DiscoveredRecords {
        let mut found = DiscoveredRecords::new();
        for (family, ids) in [(AddressFamily::V4, v4), (AddressFamily::V6, v6)] {
            for &id in ids {
                found.push(ManagedRecord {
                    id,
                    family,
                    domain: "example.com".to_string(),
                    hostname: "home".to_string(),
                    data: String::new(),
                });
            }
        }
        found
    }

    fn mock_resolver(family: AddressFamily, result: fn() -> Result<IpAddr>) -> MockIpResolver {
        let mut resolver = MockIpResolver::new();
        resolver.expect_family().return_const(family);
        resolver
            .expect_endpoint()
            .returning(|| "http://resolver.test".to_string());
        resolver.expect_resolve().returning(result);
        resolver
    }

    /// Resolver counting its calls, for tests that move the loop itself.
    struct CountingResolver {
        ip: IpAddr,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl IpResolver for CountingResolver {
        fn family(&self) -> AddressFamily {
            AddressFamily::V4
        }

        fn endpoint(&self) -> String {
            "counting".to_string()
        }

        async fn resolve(&self) -> Result<IpAddr> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.ip)
        }
    }

    /// Resolver that blocks until its gate is opened.
    struct GatedResolver {
        ip: IpAddr,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl IpResolver for GatedResolver {
        fn family(&self) -> AddressFamily {
            AddressFamily::V4
        }

        fn endpoint(&self) -> String {
            "gated".to_string()
        }

        async fn resolve(&self) -> Result<IpAddr> {
            self.gate.notified().await;
            Ok(self.ip)
        }
    }

    fn mock_provider() -> MockDnsProvider {
        let mut provider = MockDnsProvider::new();
        provider.expect_name().return_const("mock");
        provider
    }

    #[tokio::test]
    async fn test_ipv4_only_first_tick() {
        let mut provider = mock_provider();
        provider
            .expect_edit_record()
            .withf(|_, id, edit| *id == 101 && edit.record_type == "A" && edit.data == "203.0.113.5")
            .times(1)
            .returning(|_, _, _| Ok(()));

        let resolver = mock_resolver(AddressFamily::V4, || Ok(ip("203.0.113.5")));
        let mut scheduler = Scheduler::new(
            Box::new(provider),
            "example.com",
            "home",
            &discovered(&[101], &[]),
            vec![Box::new(resolver)],
        );

        let report = scheduler.tick().await;

        assert_eq!(report.jobs.len(), 1);
        assert!(matches!(
            report.get(AddressFamily::V4),
            Some(Ok(JobOutcome::Updated { edited: 1, .. }))
        ));
        assert_eq!(
            scheduler.state().last_ip(AddressFamily::V4),
            Some(ip("203.0.113.5"))
        );
        assert_eq!(scheduler.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_ipv4_failure_does_not_block_ipv6() {
        let mut provider = mock_provider();
        provider
            .expect_edit_record()
            .with(eq("example.com"), eq(201u64), always())
            .times(1)
            .returning(|_, _, _| Ok(()));

        let v4 = mock_resolver(AddressFamily::V4, || {
            Err(DdnsError::ServiceUnavailable {
                url: "https://api.ipify.org".to_string(),
                reason: "HTTP status 503 Service Unavailable".to_string(),
            })
        });
        let v6 = mock_resolver(AddressFamily::V6, || Ok(ip("2001:db8::1")));

        // Resolvers given out of order still tick IPv4 first.
        let mut scheduler = Scheduler::new(
            Box::new(provider),
            "example.com",
            "home",
            &discovered(&[101], &[201]),
            vec![Box::new(v6), Box::new(v4)],
        );

        let report = scheduler.tick().await;

        let order: Vec<_> = report.jobs.iter().map(|job| job.family).collect();
        assert_eq!(order, vec![AddressFamily::V4, AddressFamily::V6]);
        assert_eq!(report.failures(), 1);
        assert!(matches!(
            report.get(AddressFamily::V4),
            Some(Err(DdnsError::ServiceUnavailable { .. }))
        ));
        assert!(matches!(
            report.get(AddressFamily::V6),
            Some(Ok(JobOutcome::Updated { .. }))
        ));
        assert_eq!(scheduler.state().last_ip(AddressFamily::V4), None);
        assert_eq!(
            scheduler.state().last_ip(AddressFamily::V6),
            Some(ip("2001:db8::1"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_timer_waits_full_period_first() {
        let period = Duration::from_secs(900);
        let mut timer = IntervalTimer::new(period);
        assert_eq!(timer.period(), period);

        let start = Instant::now();
        timer.wait().await;
        assert!(start.elapsed() >= period);

        timer.wait().await;
        assert!(start.elapsed() >= period * 2);
    }

    #[tokio::test]
    async fn test_phase_is_running_during_tick() {
        let gate = Arc::new(Notify::new());
        let resolver = GatedResolver {
            ip: ip("203.0.113.5"),
            gate: gate.clone(),
        };

        let mut provider = mock_provider();
        provider
            .expect_edit_record()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let mut scheduler = Scheduler::new(
            Box::new(provider),
            "example.com",
            "home",
            &discovered(&[101], &[]),
            vec![Box::new(resolver)],
        );

        let mut phase = scheduler.watch_phase();
        assert_eq!(*phase.borrow_and_update(), Phase::Idle);

        let report = {
            let tick = scheduler.tick();
            tokio::pin!(tick);

            tokio::select! {
                _ = &mut tick => unreachable!("tick finished with the gate closed"),
                changed = phase.changed() => changed.unwrap(),
            }
            assert_eq!(*phase.borrow_and_update(), Phase::Running);

            gate.notify_one();
            tick.await
        };

        assert_eq!(report.failures(), 0);
        assert_eq!(*phase.borrow(), Phase::Idle);
        assert_eq!(scheduler.phase(), Phase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_timer_caps_huge_period() {
        let timer = IntervalTimer::new(Duration::MAX);
        assert_eq!(timer.period(), MAX_PERIOD);

        let timer = IntervalTimer::new(Duration::from_secs_f64(1.5e19));
        assert_eq!(timer.period(), MAX_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_ticks_once_per_period() {
        let calls = Arc::new(AtomicUsize::new(0));
        let resolver = CountingResolver {
            ip: ip("203.0.113.5"),
            calls: calls.clone(),
        };

        let mut provider = mock_provider();
        provider
            .expect_edit_record()
            .times(1)
            .returning(|_, _, _| Ok(()));

        let scheduler = Scheduler::new(
            Box::new(provider),
            "example.com",
            "home",
            &discovered(&[101], &[]),
            vec![Box::new(resolver)],
        );

        let period = Duration::from_secs(60);
        let timer = IntervalTimer::new(period);

        let run = scheduler.run(timer);
        tokio::pin!(run);

        // Nothing runs before the first full period.
        tokio::select! {
            _ = &mut run => unreachable!("scheduler loop returned"),
            _ = tokio::time::sleep(Duration::from_secs(59)) => {}
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Two more periods: ticks at 60s and 120s, only the first edits.
        let _ = tokio::time::timeout(Duration::from_secs(91), &mut run).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
