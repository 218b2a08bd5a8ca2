//! The interactive trace loop.
//!
//! Each pass: pick a target (typed or self-detected), look it up, show the
//! result, ask whether to go again. Every [`TraceError`] is shown and the
//! loop carries on; only console I/O failures end it early.

use std::io;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::display::DisplaySurface;
use crate::error::TraceError;
use crate::ip::Ipv4Target;
use crate::net::GeoService;
use crate::report;

const TARGET_PROMPT: &str = "Enter target IP (leave blank for your own IP): ";
const AGAIN_PROMPT: &str = "Trace another IP? (y/n): ";

/// Source of the local time stamped onto each report.
pub type Clock = fn() -> NaiveDateTime;

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub struct Session<S, D> {
    service: S,
    surface: D,
    clock: Clock,
}

impl<S: GeoService, D: DisplaySurface> Session<S, D> {
    pub fn new(service: S, surface: D) -> Self {
        Self::with_clock(service, surface, local_now)
    }

    pub fn with_clock(service: S, surface: D, clock: Clock) -> Self {
        Self {
            service,
            surface,
            clock,
        }
    }

    /// Run until the user declines another trace or input runs out.
    pub async fn run(&mut self) -> io::Result<()> {
        loop {
            self.surface.banner()?;

            let Some(target) = self.select_target().await? else {
                break;
            };

            self.trace(&target).await?;

            if !self.confirm_again()? {
                break;
            }
        }

        info!("session finished");
        self.surface.farewell()
    }

    /// Prompt until we have an address: a valid typed one, or the caller's
    /// own when the line is blank. `None` means input is exhausted.
    async fn select_target(&mut self) -> io::Result<Option<Ipv4Target>> {
        loop {
            let Some(line) = self.surface.prompt(TARGET_PROMPT)? else {
                return Ok(None);
            };
            let input = line.trim();

            if input.is_empty() {
                let resolved = self
                    .surface
                    .busy("Fetching your public IP...", self.service.resolve_own_ip())
                    .await;
                match resolved {
                    Ok(ip) => return Ok(Some(ip)),
                    Err(e) => self.show_error(&e)?,
                }
                continue;
            }

            match input.parse::<Ipv4Target>() {
                Ok(ip) => return Ok(Some(ip)),
                Err(e) => {
                    debug!(input = %input, "rejected target");
                    self.show_error(&e)?;
                }
            }
        }
    }

    async fn trace(&mut self, target: &Ipv4Target) -> io::Result<()> {
        let outcome = self
            .surface
            .busy("Fetching data...", self.service.lookup(target))
            .await;

        match outcome {
            Ok(record) => {
                let rows = report::build_rows(&record, (self.clock)());
                self.surface.report(&rows)
            }
            Err(e) => self.show_error(&e),
        }
    }

    fn confirm_again(&mut self) -> io::Result<bool> {
        let answer = self.surface.prompt(AGAIN_PROMPT)?;
        Ok(answer.is_some_and(|a| a.trim().eq_ignore_ascii_case("y")))
    }

    fn show_error(&mut self, err: &TraceError) -> io::Result<()> {
        info!(error = %err, "trace step failed");
        self.surface.error(&err.to_string())
    }

    #[cfg(test)]
    fn into_parts(self) -> (S, D) {
        (self.service, self.surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::future::Future;

    use chrono::NaiveDate;

    use crate::net::GeoRecord;
    use crate::report::ReportRow;

    fn fixed_clock() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 4, 21)
            .unwrap()
            .and_hms_opt(17, 35, 0)
            .unwrap()
    }

    /// Canned service that counts how often each endpoint is hit.
    struct FakeService {
        own_ip: Result<Ipv4Target, TraceError>,
        lookup: Result<GeoRecord, TraceError>,
        own_ip_calls: Cell<usize>,
        lookups: RefCell<Vec<String>>,
    }

    impl FakeService {
        fn new(
            own_ip: Result<Ipv4Target, TraceError>,
            lookup: Result<GeoRecord, TraceError>,
        ) -> Self {
            Self {
                own_ip,
                lookup,
                own_ip_calls: Cell::new(0),
                lookups: Default::default(),
            }
        }

        fn testland() -> Self {
            Self::new(
                Ok("203.0.113.7".parse().unwrap()),
                Ok(GeoRecord {
                    query: Some("203.0.113.7".into()),
                    country: Some("Testland".into()),
                    ..Default::default()
                }),
            )
        }
    }

    impl GeoService for FakeService {
        async fn resolve_own_ip(&self) -> Result<Ipv4Target, TraceError> {
            self.own_ip_calls.set(self.own_ip_calls.get() + 1);
            self.own_ip.clone()
        }

        async fn lookup(&self, ip: &Ipv4Target) -> Result<GeoRecord, TraceError> {
            self.lookups.borrow_mut().push(ip.to_string());
            self.lookup.clone()
        }
    }

    /// In-memory surface fed from a script of input lines.
    #[derive(Default)]
    struct ScriptedSurface {
        input: VecDeque<&'static str>,
        prompts: Vec<String>,
        errors: Vec<String>,
        reports: Vec<Vec<ReportRow>>,
        banners: usize,
        farewells: usize,
    }

    impl ScriptedSurface {
        fn with_input(lines: &[&'static str]) -> Self {
            Self {
                input: lines.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl DisplaySurface for ScriptedSurface {
        fn banner(&mut self) -> io::Result<()> {
            self.banners += 1;
            Ok(())
        }

        fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
            self.prompts.push(question.to_string());
            Ok(self.input.pop_front().map(str::to_string))
        }

        fn error(&mut self, message: &str) -> io::Result<()> {
            self.errors.push(message.to_string());
            Ok(())
        }

        fn report(&mut self, rows: &[ReportRow]) -> io::Result<()> {
            self.reports.push(rows.to_vec());
            Ok(())
        }

        fn farewell(&mut self) -> io::Result<()> {
            self.farewells += 1;
            Ok(())
        }

        async fn busy<F: Future>(&mut self, _message: &str, work: F) -> F::Output {
            work.await
        }
    }

    async fn run(service: FakeService, input: &[&'static str]) -> (FakeService, ScriptedSurface) {
        let mut session =
            Session::with_clock(service, ScriptedSurface::with_input(input), fixed_clock);
        session.run().await.unwrap();
        session.into_parts()
    }

    fn row<'a>(rows: &'a [ReportRow], label: &str) -> &'a str {
        rows.iter()
            .find(|r| r.label == label)
            .map(|r| r.value.as_str())
            .unwrap()
    }

    #[tokio::test]
    async fn test_blank_input_traces_own_ip() {
        let (service, surface) = run(FakeService::testland(), &["", "n"]).await;

        assert_eq!(service.own_ip_calls.get(), 1);
        assert_eq!(*service.lookups.borrow(), ["203.0.113.7"]);
        assert_eq!(surface.reports.len(), 1);

        let rows = &surface.reports[0];
        assert_eq!(rows.len(), report::ROW_COUNT);
        assert_eq!(row(rows, "Country"), "Testland");
        assert_eq!(row(rows, "IP Address"), "203.0.113.7");
        assert_eq!(row(rows, "Date & Time"), "April 21, 2020, 5:35 pm");
        assert_eq!(row(rows, "City"), "N/A");
        assert!(surface.errors.is_empty());
        assert_eq!(surface.farewells, 1);
    }

    #[tokio::test]
    async fn test_invalid_input_reprompts_without_network() {
        let (service, surface) = run(FakeService::testland(), &["999.1.1.1", "8.8.8.8", "n"]).await;

        assert_eq!(surface.errors, [TraceError::InvalidFormat.to_string()]);
        assert_eq!(service.own_ip_calls.get(), 0);
        assert_eq!(*service.lookups.borrow(), ["8.8.8.8"]);
        assert_eq!(
            surface.prompts,
            [TARGET_PROMPT, TARGET_PROMPT, AGAIN_PROMPT]
        );
    }

    #[tokio::test]
    async fn test_invalid_input_then_eof_makes_no_calls() {
        let (service, surface) = run(FakeService::testland(), &["999.1.1.1"]).await;

        assert_eq!(service.own_ip_calls.get(), 0);
        assert!(service.lookups.borrow().is_empty());
        assert!(surface.reports.is_empty());
        assert_eq!(surface.farewells, 1);
    }

    #[tokio::test]
    async fn test_input_is_trimmed() {
        let (service, _) = run(FakeService::testland(), &["  1.1.1.1  ", "n"]).await;
        assert_eq!(*service.lookups.borrow(), ["1.1.1.1"]);
    }

    #[tokio::test]
    async fn test_api_rejection_renders_nothing() {
        let service = FakeService::new(
            Ok("203.0.113.7".parse().unwrap()),
            Err(TraceError::ApiRejected("invalid query".into())),
        );
        let (_, surface) = run(service, &["127.0.0.1", "n"]).await;

        assert!(surface.reports.is_empty());
        assert_eq!(surface.errors, ["API error: invalid query"]);
        assert_eq!(surface.farewells, 1);
    }

    #[tokio::test]
    async fn test_own_ip_failure_returns_to_prompt() {
        let service = FakeService::new(
            Err(TraceError::NoNetwork),
            Ok(GeoRecord::default()),
        );
        let (service, surface) = run(service, &["", "", "9.9.9.9", "n"]).await;

        assert_eq!(service.own_ip_calls.get(), 2);
        assert_eq!(*service.lookups.borrow(), ["9.9.9.9"]);
        assert_eq!(
            surface.errors,
            [TraceError::NoNetwork.to_string(), TraceError::NoNetwork.to_string()]
        );
        assert_eq!(surface.reports.len(), 1);
    }

    #[tokio::test]
    async fn test_continue_answer_is_case_insensitive() {
        let (service, surface) =
            run(FakeService::testland(), &["8.8.8.8", " Y ", "1.1.1.1", "yes"]).await;

        assert_eq!(*service.lookups.borrow(), ["8.8.8.8", "1.1.1.1"]);
        assert_eq!(surface.reports.len(), 2);
        assert_eq!(surface.banners, 2);
        assert_eq!(surface.farewells, 1);
    }

    #[tokio::test]
    async fn test_eof_at_continue_prompt_terminates() {
        let (service, surface) = run(FakeService::testland(), &["8.8.8.8"]).await;

        assert_eq!(service.lookups.borrow().len(), 1);
        assert_eq!(surface.farewells, 1);
    }

    #[tokio::test]
    async fn test_non_utf8_target_is_reprompted() {
        use crate::display::Terminal;
        use std::io::Cursor;

        let input = Cursor::new(b"\xff\xfe\n8.8.8.8\nn\n".to_vec());
        let terminal = Terminal::new(input, Vec::new(), false);
        let mut session = Session::with_clock(FakeService::testland(), terminal, fixed_clock);
        session.run().await.unwrap();

        let (service, terminal) = session.into_parts();
        assert_eq!(*service.lookups.borrow(), ["8.8.8.8"]);
        let out = String::from_utf8(terminal.into_output()).unwrap();
        assert!(out.contains("Invalid IP address format. Please try again."));
        assert!(out.contains("Goodbye! Thanks for using IP-Tracer."));
    }
}
