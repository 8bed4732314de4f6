//! Target list, run timing, and the form model they are parsed from.

use std::time::Duration;

use crate::error::{ValidationError, WaitField};

pub const MAX_LOCATIONS: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PrimaryAction {
    #[default]
    Click,
    DoubleClick,
    Copy,
    Paste,
}

impl PrimaryAction {
    pub const ALL: [PrimaryAction; 4] = [
        PrimaryAction::Click,
        PrimaryAction::DoubleClick,
        PrimaryAction::Copy,
        PrimaryAction::Paste,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PrimaryAction::Click => "Click",
            PrimaryAction::DoubleClick => "Double-Click",
            PrimaryAction::Copy => "Copy",
            PrimaryAction::Paste => "Paste",
        }
    }
}

/// Follow-up after a double click.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SecondaryAction {
    #[default]
    Nothing,
    Copy,
    Paste,
}

impl SecondaryAction {
    pub const ALL: [SecondaryAction; 3] =
        [SecondaryAction::Nothing, SecondaryAction::Copy, SecondaryAction::Paste];

    pub fn label(self) -> &'static str {
        match self {
            SecondaryAction::Nothing => "Nothing",
            SecondaryAction::Copy => "Copy",
            SecondaryAction::Paste => "Paste",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub x: i32,
    pub y: i32,
    pub primary: PrimaryAction,
    pub secondary: SecondaryAction,
}

impl Target {
    /// Builds a target, dropping `secondary` unless the primary action is a double click.
    pub fn new(x: i32, y: i32, primary: PrimaryAction, secondary: SecondaryAction) -> Self {
        let secondary = if primary == PrimaryAction::DoubleClick {
            secondary
        } else {
            SecondaryAction::Nothing
        };
        Self { x, y, primary, secondary }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunConfig {
    pub cycle_wait: Duration,
    pub click_wait: Duration,
}

impl RunConfig {
    pub fn from_secs(cycle_secs: f64, click_secs: f64) -> Result<Self, ValidationError> {
        Ok(Self {
            cycle_wait: secs_to_duration(WaitField::Cycle, cycle_secs)?,
            click_wait: secs_to_duration(WaitField::Click, click_secs)?,
        })
    }
}

fn secs_to_duration(field: WaitField, secs: f64) -> Result<Duration, ValidationError> {
    Duration::try_from_secs_f64(secs).map_err(|_| ValidationError::Wait {
        field,
        input: secs.to_string(),
    })
}

/// Parses `"x, y"` into a pair of integers. `location` is 1-based and only used for the error.
pub fn parse_coordinates(location: usize, raw: &str) -> Result<(i32, i32), ValidationError> {
    let malformed = || ValidationError::Coordinates { location, input: raw.to_string() };

    let mut parts = raw.split(',');
    let (Some(x), Some(y), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed());
    };
    let x = x.trim().parse::<i32>().map_err(|_| malformed())?;
    let y = y.trim().parse::<i32>().map_err(|_| malformed())?;
    Ok((x, y))
}

pub fn parse_wait(field: WaitField, raw: &str) -> Result<f64, ValidationError> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(ValidationError::Wait { field, input: raw.to_string() }),
    }
}

pub fn parse_location_count(raw: &str) -> Result<usize, ValidationError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=MAX_LOCATIONS).contains(&n) => Ok(n),
        _ => Err(ValidationError::LocationCount { input: raw.to_string() }),
    }
}

// -------------- Form model --------------

/// One editable location row as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TargetRow {
    pub coords: String,
    pub primary: PrimaryAction,
    pub secondary: SecondaryAction,
}

impl TargetRow {
    pub fn set_primary(&mut self, primary: PrimaryAction) {
        self.primary = primary;
        if primary != PrimaryAction::DoubleClick {
            self.secondary = SecondaryAction::Nothing;
        }
    }
}

/// Raw text behind the configuration form. Parsed wholesale by [`TargetForm::build`].
#[derive(Clone, Debug)]
pub struct TargetForm {
    pub location_count: String,
    pub rows: Vec<TargetRow>,
    pub cycle_wait: String,
    pub click_wait: String,
}

impl TargetForm {
    pub fn new(locations: usize, cycle_wait: f64, click_wait: f64) -> Self {
        let locations = locations.clamp(1, MAX_LOCATIONS);
        Self {
            location_count: locations.to_string(),
            rows: vec![TargetRow::default(); locations],
            cycle_wait: cycle_wait.to_string(),
            click_wait: click_wait.to_string(),
        }
    }

    /// Resizes `rows` to the count typed in `location_count`, keeping existing rows.
    pub fn apply_location_count(&mut self) -> Result<usize, ValidationError> {
        let count = parse_location_count(&self.location_count)?;
        self.rows.resize_with(count, TargetRow::default);
        Ok(count)
    }

    pub fn build(&self) -> Result<(Vec<Target>, RunConfig), ValidationError> {
        if self.rows.is_empty() {
            return Err(ValidationError::NoTargets);
        }

        let targets = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let (x, y) = parse_coordinates(i + 1, &row.coords)?;
                Ok(Target::new(x, y, row.primary, row.secondary))
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        let cycle = parse_wait(WaitField::Cycle, &self.cycle_wait)?;
        let click = parse_wait(WaitField::Click, &self.click_wait)?;
        Ok((targets, RunConfig::from_secs(cycle, click)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(rows: &[(&str, PrimaryAction, SecondaryAction)]) -> TargetForm {
        let mut form = TargetForm::new(rows.len(), 1.0, 0.2);
        for (row, (coords, primary, secondary)) in form.rows.iter_mut().zip(rows) {
            row.coords = coords.to_string();
            row.primary = *primary;
            row.secondary = *secondary;
        }
        form
    }

    #[test]
    fn test_parse_coordinates() {
        assert_eq!(parse_coordinates(1, "100, 200"), Ok((100, 200)));
        assert_eq!(parse_coordinates(1, " -5 ,7 "), Ok((-5, 7)));

        for bad in ["abc,200", "100", "100,200,300", "", "1.5,2", "100;200"] {
            assert_eq!(
                parse_coordinates(2, bad),
                Err(ValidationError::Coordinates { location: 2, input: bad.to_string() }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_parse_wait() {
        assert_eq!(parse_wait(WaitField::Cycle, "0"), Ok(0.0));
        assert_eq!(parse_wait(WaitField::Click, " 0.25 "), Ok(0.25));
        assert!(parse_wait(WaitField::Cycle, "-1").is_err());
        assert!(parse_wait(WaitField::Cycle, "soon").is_err());
        assert!(parse_wait(WaitField::Cycle, "NaN").is_err());
        assert!(parse_wait(WaitField::Cycle, "inf").is_err());
    }

    #[test]
    fn test_parse_location_count() {
        assert_eq!(parse_location_count("1"), Ok(1));
        assert_eq!(parse_location_count("10"), Ok(10));
        assert!(parse_location_count("0").is_err());
        assert!(parse_location_count("11").is_err());
        assert!(parse_location_count("four").is_err());
    }

    #[test]
    fn test_target_drops_secondary_unless_double_click() {
        let t = Target::new(1, 2, PrimaryAction::Click, SecondaryAction::Copy);
        assert_eq!(t.secondary, SecondaryAction::Nothing);

        let t = Target::new(1, 2, PrimaryAction::DoubleClick, SecondaryAction::Paste);
        assert_eq!(t.secondary, SecondaryAction::Paste);
    }

    #[test]
    fn test_run_config_zero_and_negative() {
        let cfg = RunConfig::from_secs(0.0, 0.0).unwrap();
        assert_eq!(cfg.cycle_wait, Duration::ZERO);
        assert_eq!(cfg.click_wait, Duration::ZERO);
        assert!(RunConfig::from_secs(-1.0, 0.0).is_err());
        assert!(RunConfig::from_secs(0.0, -0.1).is_err());
    }

    #[test]
    fn test_form_build() {
        let form = form(&[
            ("100,100", PrimaryAction::Click, SecondaryAction::Nothing),
            ("200, 200", PrimaryAction::DoubleClick, SecondaryAction::Copy),
        ]);
        let (targets, config) = form.build().unwrap();
        assert_eq!(
            targets,
            vec![
                Target::new(100, 100, PrimaryAction::Click, SecondaryAction::Nothing),
                Target::new(200, 200, PrimaryAction::DoubleClick, SecondaryAction::Copy),
            ]
        );
        assert_eq!(config.cycle_wait, Duration::from_secs(1));
        assert_eq!(config.click_wait, Duration::from_millis(200));
    }

    #[test]
    fn test_form_build_rejects_whole_batch() {
        let form = form(&[
            ("100,100", PrimaryAction::Click, SecondaryAction::Nothing),
            ("abc,200", PrimaryAction::Click, SecondaryAction::Nothing),
        ]);
        assert_eq!(
            form.build(),
            Err(ValidationError::Coordinates { location: 2, input: "abc,200".into() })
        );

        let mut form = self::form(&[("1,1", PrimaryAction::Click, SecondaryAction::Nothing)]);
        form.cycle_wait = "-2".into();
        assert!(matches!(
            form.build(),
            Err(ValidationError::Wait { field: WaitField::Cycle, .. })
        ));
    }

    #[test]
    fn test_apply_location_count_keeps_rows() {
        let mut form = form(&[("5,5", PrimaryAction::Paste, SecondaryAction::Nothing)]);
        form.location_count = "3".into();
        assert_eq!(form.apply_location_count(), Ok(3));
        assert_eq!(form.rows.len(), 3);
        assert_eq!(form.rows[0].coords, "5,5");
        assert_eq!(form.rows[2], TargetRow::default());

        form.location_count = "12".into();
        assert!(form.apply_location_count().is_err());
        assert_eq!(form.rows.len(), 3);
    }

    #[test]
    fn test_row_set_primary_resets_secondary() {
        let mut row = TargetRow {
            coords: String::new(),
            primary: PrimaryAction::DoubleClick,
            secondary: SecondaryAction::Copy,
        };
        row.set_primary(PrimaryAction::Click);
        assert_eq!(row.secondary, SecondaryAction::Nothing);
    }
}
