//! Day-bucketed score ledger.
//!
//! One counter per weekday (0 = Sunday .. 6 = Saturday) as observed in the
//! reference timezone, never in server-local time.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::config::LEDGER_DAYS;

/// Weekday slot in the ledger, always in `0..LEDGER_DAYS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct DayIndex(u8);

impl DayIndex {
  pub fn new(index: u8) -> Option<Self> {
    ((index as usize) < LEDGER_DAYS).then_some(Self(index))
  }

  pub fn get(&self) -> u8 {
    self.0
  }
}

/// Weekday of `now` in `tz`, Sunday-based.
pub fn resolve_day_index(now: DateTime<Utc>, tz: Tz) -> DayIndex {
  DayIndex(now.with_timezone(&tz).weekday().num_days_from_sunday() as u8)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
  days: [u32; LEDGER_DAYS],
}

impl Ledger {
  /// Stored form of an all-zero ledger, used by the weekly reset
  pub const ZERO_JSON: &'static str = "[0,0,0,0,0,0,0]";

  pub fn zeroed() -> Self {
    Self::default()
  }

  /// Parse a stored ledger. Anything that is not a 7-slot array reads as all
  /// zeros; inside a 7-slot array, slots that are not non-negative integers
  /// read as zero.
  pub fn from_json(raw: Option<&str>) -> Self {
    let Some(raw) = raw else {
      return Self::zeroed();
    };
    let Ok(serde_json::Value::Array(slots)) = serde_json::from_str::<serde_json::Value>(raw) else {
      return Self::zeroed();
    };
    if slots.len() != LEDGER_DAYS {
      return Self::zeroed();
    }

    let mut ledger = Self::zeroed();
    for (day, slot) in ledger.days.iter_mut().zip(slots.iter()) {
      *day = slot
        .as_u64()
        .map(|n| n.min(u32::MAX as u64) as u32)
        .unwrap_or(0);
    }
    ledger
  }

  pub fn to_json(&self) -> String {
    serde_json::to_string(&self.days).unwrap_or_else(|_| Self::ZERO_JSON.to_string())
  }

  pub fn increment_today(&mut self, day: DayIndex) {
    let slot = &mut self.days[day.get() as usize];
    *slot = slot.saturating_add(1);
  }

  pub fn read_today(&self, day: DayIndex) -> u32 {
    self.days[day.get() as usize]
  }

  pub fn days(&self) -> &[u32; LEDGER_DAYS] {
    &self.days
  }

  pub fn is_zero(&self) -> bool {
    self.days.iter().all(|&d| d == 0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
  }

  #[test]
  fn test_day_index_bounds() {
    assert!(DayIndex::new(0).is_some());
    assert!(DayIndex::new(6).is_some());
    assert!(DayIndex::new(7).is_none());
  }

  #[test]
  fn test_resolve_day_index_uses_reference_timezone() {
    // 2026-10-15 21:30 UTC is already Friday 00:30 in Jerusalem (UTC+3)
    let now = utc(2026, 10, 15, 21, 30, 0);
    assert_eq!(resolve_day_index(now, chrono_tz::UTC).get(), 4); // Thursday
    assert_eq!(resolve_day_index(now, chrono_tz::Asia::Jerusalem).get(), 5); // Friday
  }

  #[test]
  fn test_resolve_day_index_stable_within_local_day() {
    let tz = chrono_tz::Asia::Jerusalem;
    let start = resolve_day_index(utc(2026, 10, 15, 21, 0, 0), tz);
    for hour_offset in [0i64, 3, 9, 15, 20, 23] {
      let now = utc(2026, 10, 15, 21, 0, 0) + chrono::Duration::hours(hour_offset);
      assert_eq!(resolve_day_index(now, tz), start);
    }
  }

  #[test]
  fn test_resolve_day_index_advances_at_local_midnight() {
    let tz = chrono_tz::Asia::Jerusalem;
    // Thursday 23:59:59 → Friday 00:00:00 local
    assert_eq!(resolve_day_index(utc(2026, 10, 15, 20, 59, 59), tz).get(), 4);
    assert_eq!(resolve_day_index(utc(2026, 10, 15, 21, 0, 0), tz).get(), 5);
    // Saturday → Sunday wraps to 0
    assert_eq!(resolve_day_index(utc(2026, 10, 17, 20, 59, 59), tz).get(), 6);
    assert_eq!(resolve_day_index(utc(2026, 10, 17, 21, 0, 0), tz).get(), 0);
  }

  #[test]
  fn test_increment_then_read() {
    let mut ledger = Ledger::from_json(Some("[1,2,3,4,5,6,7]"));
    let day = DayIndex::new(3).unwrap();
    let before = ledger.read_today(day);

    ledger.increment_today(day);

    assert_eq!(ledger.read_today(day), before + 1);
    assert_eq!(ledger.days(), &[1, 2, 3, 5, 5, 6, 7]);
  }

  #[test]
  fn test_from_json_malformed_reads_zero() {
    for raw in [None, Some("null"), Some("[1,2,3]"), Some("\"oops\""), Some("not json"), Some("{}")] {
      let ledger = Ledger::from_json(raw);
      assert!(ledger.is_zero(), "expected zeros for {:?}", raw);
    }
  }

  #[test]
  fn test_from_json_bad_slots_read_zero() {
    let ledger = Ledger::from_json(Some(r#"[1,"x",-4,2.5,null,6,7]"#));
    assert_eq!(ledger.days(), &[1, 0, 0, 0, 0, 6, 7]);
  }

  #[test]
  fn test_to_json() {
    assert_eq!(Ledger::zeroed().to_json(), Ledger::ZERO_JSON);
    let mut ledger = Ledger::zeroed();
    ledger.increment_today(DayIndex::new(6).unwrap());
    assert_eq!(ledger.to_json(), "[0,0,0,0,0,0,1]");
  }
}
