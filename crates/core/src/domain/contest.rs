use std::fmt;

use chrono::{DateTime, Utc};

use super::{ContestId, DomainError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoringRule {
    Icpc,
    Ioi,
    /// Scored like ICPC until custom rules exist.
    Custom,
}

impl ScoringRule {
    pub fn code(self) -> i16 {
        match self {
            ScoringRule::Icpc => 0,
            ScoringRule::Ioi => 1,
            ScoringRule::Custom => 2,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, DomainError> {
        match code {
            0 => Ok(ScoringRule::Icpc),
            1 => Ok(ScoringRule::Ioi),
            2 => Ok(ScoringRule::Custom),
            _ => Err(DomainError::UnknownScoringRule(code)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoringRule::Icpc => "ICPC",
            ScoringRule::Ioi => "IOI",
            ScoringRule::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContestStatus {
    Upcoming,
    RegistrationOpen,
    Ongoing,
    Ended,
}

impl ContestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContestStatus::Upcoming => "UPCOMING",
            ContestStatus::RegistrationOpen => "REGISTRATION_OPEN",
            ContestStatus::Ongoing => "ONGOING",
            ContestStatus::Ended => "ENDED",
        }
    }
}

impl fmt::Display for ContestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive time range during which public standings stop moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FreezeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidFreezeWindow);
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && now <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    pub id: ContestId,
    pub title: String,
    pub registration_start: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub scoring_rule: ScoringRule,
    pub freeze: Option<FreezeWindow>,
    pub results_published: bool,
}

impl Contest {
    pub fn status(&self, now: DateTime<Utc>) -> ContestStatus {
        if now < self.registration_start {
            ContestStatus::Upcoming
        } else if now < self.start_time {
            ContestStatus::RegistrationOpen
        } else if now < self.end_time {
            ContestStatus::Ongoing
        } else {
            ContestStatus::Ended
        }
    }

    pub fn is_frozen(&self, now: DateTime<Utc>) -> bool {
        self.freeze.is_some_and(|window| window.contains(now))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn contest(freeze: Option<FreezeWindow>) -> Contest {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        Contest {
            id: ContestId::new(),
            title: "Spring Cup".to_string(),
            registration_start: start - Duration::days(7),
            start_time: start,
            end_time: start + Duration::hours(5),
            scoring_rule: ScoringRule::Icpc,
            freeze,
            results_published: false,
        }
    }

    #[test]
    fn status_follows_the_contest_timeline() {
        let contest = contest(None);
        let start = contest.start_time;

        assert_eq!(contest.status(start - Duration::days(8)), ContestStatus::Upcoming);
        assert_eq!(
            contest.status(start - Duration::days(1)),
            ContestStatus::RegistrationOpen
        );
        assert_eq!(contest.status(start), ContestStatus::Ongoing);
        assert_eq!(contest.status(contest.end_time), ContestStatus::Ended);
    }

    #[test]
    fn freeze_window_is_inclusive_on_both_ends() {
        let base = contest(None);
        let window = FreezeWindow::new(
            base.end_time - Duration::hours(1),
            base.end_time + Duration::hours(1),
        )
        .expect("window should be valid");
        let contest = contest(Some(window));

        assert!(!contest.is_frozen(window.start() - Duration::seconds(1)));
        assert!(contest.is_frozen(window.start()));
        assert!(contest.is_frozen(window.end()));
        assert!(!contest.is_frozen(window.end() + Duration::seconds(1)));
    }

    #[test]
    fn contest_without_window_is_never_frozen() {
        let contest = contest(None);
        assert!(!contest.is_frozen(contest.start_time));
    }

    #[test]
    fn inverted_freeze_window_is_rejected() {
        let now = Utc::now();
        let err = FreezeWindow::new(now, now - Duration::minutes(1))
            .expect_err("start after end should be rejected");
        assert_eq!(err, DomainError::InvalidFreezeWindow);
    }

    #[test]
    fn scoring_rule_codes_roundtrip() {
        for rule in [ScoringRule::Icpc, ScoringRule::Ioi, ScoringRule::Custom] {
            assert_eq!(ScoringRule::from_code(rule.code()), Ok(rule));
        }
        assert!(ScoringRule::from_code(9).is_err());
    }
}
