use std::collections::BTreeMap;
use std::io::{self, Write};
use std::str::FromStr;

use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::calibration::CalibrationSettings;
use crate::domain::class_size::ClassSizeCatalog;
use crate::domain::enrollment::{GradeCounts, HistoricalEnrollmentYear};
use crate::domain::grade::{GradeDefinition, GradeSequence, GradeSequenceError};
use crate::domain::overrides::Overrides;
use crate::domain::rates::{DocumentDefault, DocumentDefaults};
use crate::domain::scenario::{ScenarioParams, standard_lateral_multiplier};
use crate::services::projection::{PriorityOrder, ReductionStrategy, UniformPercentage};
use crate::services::proration::FiscalCalendar;

#[derive(Error, Debug)]
pub enum ForecastYamlError {
    #[error("failed to read forecast yaml: {0}")]
    Read(#[from] io::Error),
    #[error("failed to parse forecast yaml: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("unknown grade {grade} in {section}")]
    UnknownGrade { section: String, grade: String },
    #[error("grade {grade} is listed more than once in {section}")]
    DuplicateGrade { section: String, grade: String },
    #[error("invalid month name: {0}")]
    InvalidMonth(String),
    #[error("invalid grade sequence: {0}")]
    InvalidSequence(#[from] GradeSequenceError),
    #[error("invalid reduction strategy: {0}")]
    InvalidStrategy(String),
}

/// How a capacity excess is spread over grades.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReductionStrategyKind {
    #[default]
    UniformPercentage,
    PriorityOrder { order: Vec<String> },
}

impl ReductionStrategyKind {
    pub fn strategy(&self) -> Box<dyn ReductionStrategy> {
        match self {
            ReductionStrategyKind::UniformPercentage => Box::new(UniformPercentage),
            ReductionStrategyKind::PriorityOrder { order } => Box::new(PriorityOrder {
                order: order.clone(),
            }),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
pub struct ForecastSettings {
    pub calibration: CalibrationSettings,
    pub reduction: ReductionStrategyKind,
    pub calendar: FiscalCalendar,
}

/// Everything a forecast run needs, validated against the grade sequence.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ForecastInput {
    pub school: String,
    pub base_year: i32,
    pub projection_years: u32,
    pub school_max_capacity: u32,
    pub sequence: GradeSequence,
    pub history: Vec<HistoricalEnrollmentYear>,
    pub base_enrollment: GradeCounts,
    pub scenario: ScenarioParams,
    pub class_sizes: ClassSizeCatalog,
    pub overrides: Overrides,
    pub document_defaults: DocumentDefaults,
    pub settings: ForecastSettings,
}

#[derive(Serialize, Deserialize)]
struct ForecastRecord {
    school: String,
    base_year: i32,
    projection_years: u32,
    school_max_capacity: u32,
    grades: Option<Vec<GradeDefinition>>,
    #[serde(default)]
    history: Vec<HistoryRecord>,
    base_enrollment: GradeCounts,
    scenario: ScenarioRecord,
    class_sizes: Option<ClassSizeCatalog>,
    overrides: Option<Overrides>,
    document_defaults: Option<BTreeMap<String, DocumentDefault>>,
    settings: Option<SettingsRecord>,
}

#[derive(Serialize, Deserialize)]
struct HistoryRecord {
    fiscal_year: i32,
    grades: GradeCounts,
}

#[derive(Serialize, Deserialize)]
struct ScenarioRecord {
    code: Option<String>,
    ps_entry: u32,
    entry_growth_rate: Option<Decimal>,
    default_retention: Option<Decimal>,
    terminal_retention: Option<Decimal>,
    lateral_multiplier: Option<Decimal>,
}

#[derive(Serialize, Deserialize, Default)]
struct SettingsRecord {
    weight_n1: Option<Decimal>,
    weight_n2: Option<Decimal>,
    min_calibrated_share: Option<Decimal>,
    reduction_strategy: Option<String>,
    priority_order: Option<Vec<String>>,
    fiscal_year_start: Option<String>,
    academic_year_start: Option<String>,
}

pub fn load_forecast_input_from_yaml_file(path: &str) -> Result<ForecastInput, ForecastYamlError> {
    let contents = std::fs::read_to_string(path)?;
    deserialize_forecast_input_from_yaml_str(&contents)
}

pub fn deserialize_forecast_input_from_yaml_str(
    input: &str,
) -> Result<ForecastInput, ForecastYamlError> {
    let record: ForecastRecord = serde_yaml::from_str(input)?;

    let custom_sequence = record.grades.is_some();
    let sequence = match record.grades {
        Some(grades) => GradeSequence::new(grades)?,
        None => GradeSequence::french_standard(),
    };

    let history: Vec<HistoricalEnrollmentYear> = record
        .history
        .into_iter()
        .map(|year| HistoricalEnrollmentYear {
            fiscal_year: year.fiscal_year,
            grades: year.grades,
        })
        .collect();
    for year in &history {
        check_grades(&sequence, &format!("history {}", year.fiscal_year), year.grades.keys())?;
    }
    check_grades(&sequence, "base_enrollment", record.base_enrollment.keys())?;

    let class_sizes = record.class_sizes.unwrap_or_default();
    check_grades(&sequence, "class_sizes", class_sizes.grades.keys())?;

    let overrides = record.overrides.unwrap_or_default();
    check_grades(&sequence, "overrides", overrides.grades.keys())?;

    let document_defaults = match record.document_defaults {
        Some(grades) => {
            check_grades(&sequence, "document_defaults", grades.keys())?;
            DocumentDefaults { grades }
        }
        None if custom_sequence => DocumentDefaults::default(),
        None => DocumentDefaults::french_standard(),
    };

    let settings = settings_from_record(record.settings.unwrap_or_default(), &sequence)?;

    Ok(ForecastInput {
        school: record.school,
        base_year: record.base_year,
        projection_years: record.projection_years,
        school_max_capacity: record.school_max_capacity,
        sequence,
        history,
        base_enrollment: record.base_enrollment,
        scenario: scenario_from_record(record.scenario),
        class_sizes,
        overrides,
        document_defaults,
        settings,
    })
}

/// Writes any serializable report as YAML.
pub fn serialize_to_yaml<W: Write, T: Serialize>(writer: &mut W, value: &T) -> io::Result<()> {
    let yaml = serde_yaml::to_string(value).map_err(io::Error::other)?;
    writer.write_all(yaml.as_bytes())
}

pub fn write_yaml_file<T: Serialize>(path: &str, value: &T) -> io::Result<()> {
    let mut buffer = Vec::new();
    serialize_to_yaml(&mut buffer, value)?;
    std::fs::write(path, buffer)
}

fn scenario_from_record(record: ScenarioRecord) -> ScenarioParams {
    let defaults = ScenarioParams::base(record.ps_entry);
    let code = record.code.unwrap_or(defaults.code);
    let lateral_multiplier = record
        .lateral_multiplier
        .or_else(|| standard_lateral_multiplier(&code))
        .unwrap_or(defaults.lateral_multiplier);

    ScenarioParams {
        code,
        ps_entry: record.ps_entry,
        entry_growth_rate: record.entry_growth_rate.unwrap_or(defaults.entry_growth_rate),
        default_retention: record.default_retention.unwrap_or(defaults.default_retention),
        terminal_retention: record
            .terminal_retention
            .unwrap_or(defaults.terminal_retention),
        lateral_multiplier,
    }
}

fn settings_from_record(
    record: SettingsRecord,
    sequence: &GradeSequence,
) -> Result<ForecastSettings, ForecastYamlError> {
    let defaults = CalibrationSettings::default();
    let calibration = CalibrationSettings {
        weight_n1: record.weight_n1.unwrap_or(defaults.weight_n1),
        weight_n2: record.weight_n2.unwrap_or(defaults.weight_n2),
        min_calibrated_share: record
            .min_calibrated_share
            .unwrap_or(defaults.min_calibrated_share),
    };

    let order = record.priority_order.unwrap_or_default();
    check_grades(sequence, "priority_order", order.iter())?;
    if let Some(repeated) = order
        .iter()
        .enumerate()
        .find_map(|(idx, code)| order[..idx].contains(code).then_some(code))
    {
        return Err(ForecastYamlError::DuplicateGrade {
            section: "priority_order".to_string(),
            grade: repeated.clone(),
        });
    }
    let reduction = match record.reduction_strategy.as_deref().map(str::trim) {
        None | Some("uniform_percentage") => ReductionStrategyKind::UniformPercentage,
        Some("priority_order") => ReductionStrategyKind::PriorityOrder { order },
        Some(other) => return Err(ForecastYamlError::InvalidStrategy(other.to_string())),
    };

    let calendar_defaults = FiscalCalendar::default();
    let calendar = FiscalCalendar {
        fiscal_year_start: parse_month(record.fiscal_year_start.as_deref())?
            .unwrap_or(calendar_defaults.fiscal_year_start),
        academic_year_start: parse_month(record.academic_year_start.as_deref())?
            .unwrap_or(calendar_defaults.academic_year_start),
    };

    Ok(ForecastSettings {
        calibration,
        reduction,
        calendar,
    })
}

fn parse_month(value: Option<&str>) -> Result<Option<Month>, ForecastYamlError> {
    match value {
        None => Ok(None),
        Some(raw) => Month::from_str(raw.trim())
            .map(Some)
            .map_err(|_| ForecastYamlError::InvalidMonth(raw.to_string())),
    }
}

fn check_grades<'a>(
    sequence: &GradeSequence,
    section: &str,
    codes: impl Iterator<Item = &'a String>,
) -> Result<(), ForecastYamlError> {
    for code in codes {
        if !sequence.contains(code) {
            return Err(ForecastYamlError::UnknownGrade {
                section: section.to_string(),
                grade: code.clone(),
            });
        }
    }
    Ok(())
}
