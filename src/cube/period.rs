//! Period constraints and date resolution.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;

use super::{fact_concept, fact_dimension, CoreDimension};
use crate::model::{
    parse_boundary, parse_month_day, FactPeriod, PeriodAnchor, PeriodFormat, PeriodType,
    QName, TaxonomyModel, TaxonomyObject,
};

/// The parsed period of a fact, memoized on the fact.
pub fn fact_period(fact: &TaxonomyObject) -> Option<&FactPeriod> {
    fact.cache
        .fact_period
        .get_or_init(|| {
            fact_dimension(fact, &CoreDimension::Period.qname())
                .and_then(|value| FactPeriod::parse(&value.to_string()))
        })
        .as_ref()
}

/// The parsed `periodFormat` of a constraint, memoized on the constraint.
pub fn period_format(constraint: &TaxonomyObject) -> Option<&PeriodFormat> {
    constraint
        .cache
        .period_format
        .get_or_init(|| {
            constraint
                .str("periodFormat")
                .and_then(|text| PeriodFormat::parse(text).ok())
        })
        .as_ref()
}

/// Whether `period` satisfies every part of one PeriodConstraint.
pub fn constraint_matches(
    model: &TaxonomyModel,
    constraint: &TaxonomyObject,
    fact: &TaxonomyObject,
    period: Option<&FactPeriod>,
) -> bool {
    let Some(expected) = constraint.str("periodType").and_then(PeriodType::parse) else {
        return false;
    };
    let Some(period) = period else {
        return expected == PeriodType::None;
    };
    if period.period_type() != expected {
        return false;
    }

    if let Some(span) = constraint.duration("timeSpan") {
        match (period, span.add_to(period.start())) {
            (FactPeriod::Duration { end, .. }, Some(shifted)) if shifted == *end => {}
            _ => return false,
        }
    }
    if constraint.has("periodFormat") {
        match period_format(constraint) {
            Some(format) if format.matches(period) => {}
            _ => return false,
        }
    }

    let sub = |property: &str| constraint.child(property).map(|id| model.object(id));
    if let Some(resolution) = sub("monthDay") {
        let last = period.last_day();
        if resolve_month_day(model, resolution, fact) != Some((last.month(), last.day())) {
            return false;
        }
    }
    if let Some(resolution) = sub("endDate") {
        if resolve_date(model, resolution, fact, PeriodAnchor::End) != Some(period.end()) {
            return false;
        }
    }
    if let Some(resolution) = sub("startDate") {
        if resolve_date(model, resolution, fact, PeriodAnchor::Start) != Some(period.start()) {
            return false;
        }
    }
    if let Some(resolution) = sub("onOrAfter") {
        match resolve_date(model, resolution, fact, PeriodAnchor::Start) {
            Some(at) if period.start() >= at => {}
            _ => return false,
        }
    }
    if let Some(resolution) = sub("onOrBefore") {
        match resolve_date(model, resolution, fact, PeriodAnchor::End) {
            Some(at) if period.end() <= at => {}
            _ => return false,
        }
    }
    true
}

/// Resolves a DateResolution to a timestamp, relative to `fact`.
///
/// The value comes from the first of `value`, `conceptName` (the value of a
/// fact for that concept) or `context` (a period boundary of a fact for
/// that concept); `timeShift` is applied last. `anchor` decides how a bare
/// date is widened.
pub fn resolve_date(
    model: &TaxonomyModel,
    resolution: &TaxonomyObject,
    fact: &TaxonomyObject,
    anchor: PeriodAnchor,
) -> Option<NaiveDateTime> {
    let at = if let Some(text) = resolution.str("value") {
        parse_boundary(text, anchor)?
    } else if let Some(concept) = resolution.qname("conceptName") {
        let source = related_fact(model, fact, concept)?;
        parse_boundary(&fact_value(source)?, anchor)?
    } else if let Some(context) = resolution.qname("context") {
        let source = related_fact(model, fact, context)?;
        fact_period(source)?.boundary(context.anchor_or_default())
    } else {
        return None;
    };
    match resolution.duration("timeShift") {
        Some(shift) => shift.add_to(at),
        None => Some(at),
    }
}

/// Resolves a DateResolution used as a `monthDay` to `(month, day)`.
pub fn resolve_month_day(
    model: &TaxonomyModel,
    resolution: &TaxonomyObject,
    fact: &TaxonomyObject,
) -> Option<(u32, u32)> {
    if let Some(text) = resolution.str("value") {
        if let Some((month, day)) = parse_month_day(text) {
            let Some(shift) = resolution.duration("timeShift") else {
                return Some((month, day));
            };
            let date = NaiveDate::from_ymd_opt(2000, month, day)?;
            let shifted = shift.add_to_date(date)?;
            return Some((shifted.month(), shifted.day()));
        }
    }
    let at = resolve_date(model, resolution, fact, PeriodAnchor::End)?;
    let day = calendar_day(at);
    Some((day.month(), day.day()))
}

/// The calendar day a boundary timestamp closes: midnight belongs to the
/// previous day.
fn calendar_day(at: NaiveDateTime) -> NaiveDate {
    if at.time() == NaiveTime::MIN {
        at.date().pred_opt().unwrap_or(at.date())
    } else {
        at.date()
    }
}

/// The first fact for `concept` reported for the same entity as `fact`, in
/// document order.
fn related_fact<'m>(
    model: &'m TaxonomyModel,
    fact: &TaxonomyObject,
    concept: &QName,
) -> Option<&'m TaxonomyObject> {
    let entity = CoreDimension::Entity.qname();
    let wanted = fact_dimension(fact, &entity);
    model
        .facts()
        .find(|candidate| fact_concept(candidate) == Some(concept) && fact_dimension(candidate, &entity) == wanted)
}

fn fact_value(fact: &TaxonomyObject) -> Option<String> {
    match fact.any("value")? {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Whether a `value` literal can be resolved: a date, a timestamp or a
/// `--MM-DD` month-day.
pub(crate) fn is_date_literal(text: &str) -> bool {
    parse_boundary(text, PeriodAnchor::End).is_some() || parse_month_day(text).is_some()
}
