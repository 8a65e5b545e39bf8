use anyhow::{
  Context,
  anyhow
};
use std::sync::LazyLock;

use chrono::{
  DateTime,
  Duration,
  Local,
  LocalResult,
  NaiveDate,
  NaiveDateTime,
  TimeDelta,
  TimeZone,
  Utc
};
use regex::Regex;

static RELATIVE_RE: LazyLock<Regex> =
  LazyLock::new(|| {
    Regex::new(
      r"^(?P<sign>[+-])(?P<num>\d+)(?P<unit>[hdw])$"
    )
    .expect("offset pattern is valid")
  });

/// Parses the date given to `add --at`:
/// `now`, `today`, `tomorrow`,
/// `yesterday`, `YYYY-MM-DD`,
/// `YYYY-MM-DDTHH:MM`, RFC 3339, or an
/// offset such as `+3d`, `-2h`, `+1w`.
/// Calendar dates are local midnight.
pub fn parse_date_expr(
  input: &str,
  now: DateTime<Utc>
) -> anyhow::Result<DateTime<Utc>> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => {
      let date = now
        .with_timezone(&Local)
        .date_naive();
      return local_midnight(date);
    }
    | "tomorrow" => {
      let today =
        parse_date_expr("today", now)?;
      return Ok(
        today + Duration::days(1)
      );
    }
    | "yesterday" => {
      let today =
        parse_date_expr("today", now)?;
      return Ok(
        today - Duration::days(1)
      );
    }
    | _ => {}
  }

  if let Some(caps) =
    RELATIVE_RE.captures(&lower)
  {
    let amount: i64 = caps["num"]
      .parse()
      .context("invalid offset")?;
    let step = match &caps["unit"] {
      | "h" => TimeDelta::try_hours(amount),
      | "d" => TimeDelta::try_days(amount),
      | _ => TimeDelta::try_weeks(amount)
    }
    .ok_or_else(|| {
      anyhow!("offset out of range: {input}")
    })?;
    let shifted = if &caps["sign"] == "-" {
      now.checked_sub_signed(step)
    } else {
      now.checked_add_signed(step)
    };
    return shifted.ok_or_else(|| {
      anyhow!("date out of range: {input}")
    });
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  if let Ok(naive) =
    NaiveDateTime::parse_from_str(
      token,
      "%Y-%m-%dT%H:%M"
    )
  {
    return to_utc_from_local(naive);
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return local_midnight(date);
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
}

/// Header line of the list, e.g.
/// `Fri, 16 October`.
#[must_use]
pub fn format_day_header(
  now: DateTime<Utc>
) -> String {
  now
    .with_timezone(&Local)
    .format("%a, %-d %B")
    .to_string()
}

#[must_use]
pub fn format_local(
  dt: DateTime<Utc>
) -> String {
  dt.with_timezone(&Local)
    .format("%Y-%m-%d %H:%M")
    .to_string()
}

fn local_midnight(
  date: NaiveDate
) -> anyhow::Result<DateTime<Utc>> {
  let midnight = date
    .and_hms_opt(0, 0, 0)
    .ok_or_else(|| {
      anyhow!(
        "failed to construct \
         midnight for {date}"
      )
    })?;
  to_utc_from_local(midnight)
}

fn to_utc_from_local(
  naive: NaiveDateTime
) -> anyhow::Result<DateTime<Utc>> {
  match Local.from_local_datetime(&naive)
  {
    | LocalResult::Single(dt) => {
      Ok(dt.with_timezone(&Utc))
    }
    | LocalResult::Ambiguous(
      earliest,
      _
    ) => Ok(
      earliest.with_timezone(&Utc)
    ),
    | LocalResult::None => Err(anyhow!(
      "local time {naive} does not \
       exist"
    ))
  }
}

#[cfg(test)]
mod tests {
  use chrono::{
    Duration,
    TimeZone,
    Utc
  };

  use super::parse_date_expr;

  #[test]
  fn keywords_and_offsets() {
    let now = Utc
      .with_ymd_and_hms(
        2026, 10, 16, 12, 0, 0
      )
      .unwrap();

    assert_eq!(
      parse_date_expr("now", now)
        .unwrap(),
      now
    );
    let today =
      parse_date_expr("today", now)
        .unwrap();
    assert_eq!(
      parse_date_expr("Tomorrow", now)
        .unwrap(),
      today + Duration::days(1)
    );
    assert_eq!(
      parse_date_expr("+3d", now)
        .unwrap(),
      now + Duration::days(3)
    );
    assert_eq!(
      parse_date_expr("-2h", now)
        .unwrap(),
      now - Duration::hours(2)
    );
    assert_eq!(
      parse_date_expr("+1w", now)
        .unwrap(),
      now + Duration::weeks(1)
    );
  }

  #[test]
  fn absolute_forms() {
    let now = Utc::now();
    assert_eq!(
      parse_date_expr(
        "2021-05-01T15:30:00.000Z",
        now
      )
      .unwrap(),
      Utc
        .with_ymd_and_hms(
          2021, 5, 1, 15, 30, 0
        )
        .unwrap()
    );
    assert!(
      parse_date_expr("2026-12-24", now)
        .is_ok()
    );
    assert!(
      parse_date_expr(
        "2026-12-24T09:15",
        now
      )
      .is_ok()
    );
  }

  #[test]
  fn rejects_garbage() {
    let now = Utc::now();
    assert!(
      parse_date_expr("someday", now)
        .is_err()
    );
    assert!(
      parse_date_expr("+3y", now)
        .is_err()
    );
  }

  #[test]
  fn huge_offsets_are_errors() {
    let now = Utc::now();
    for expr in [
      "+99999999w",
      "-99999999w",
      "+9999999999999d",
      "+99999999999999999999h"
    ] {
      assert!(
        parse_date_expr(expr, now)
          .is_err(),
        "{expr} should not parse"
      );
    }
    assert!(
      parse_date_expr("+5200w", now)
        .is_ok()
    );
  }
}
