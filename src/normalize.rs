//! Typed champion records built from a [`RawTable`].

use std::fmt;

use log::{debug, warn};

use crate::config::InvalidValuePolicy;
use crate::error::{ReportError, Result};
use crate::loader::{is_missing, RawTable};

/// Optional column carrying a per-record buff cooldown.
pub const BUFF_COOLDOWN_COLUMN: &str = "Buff_Skill_Cooldown";

/// Optional column carrying a per-record debuff cooldown.
pub const DEBUFF_COOLDOWN_COLUMN: &str = "Debuff_Skill_Cooldown";

/// Elemental alignment of a champion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Affinity {
    Magic,
    Force,
    Spirit,
    Void,
}

impl Affinity {
    /// Maps the numeric code used in the source data; unknown codes have no affinity.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Affinity::Magic),
            2 => Some(Affinity::Force),
            3 => Some(Affinity::Spirit),
            4 => Some(Affinity::Void),
            _ => None,
        }
    }

    /// Parses a raw cell; integral floats such as `"2.0"` are accepted.
    pub fn parse(cell: &str) -> Option<Self> {
        parse_integral(cell).and_then(Self::from_code)
    }

    pub fn label(self) -> &'static str {
        match self {
            Affinity::Magic => "Magic",
            Affinity::Force => "Force",
            Affinity::Spirit => "Spirit",
            Affinity::Void => "Void",
        }
    }
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Numeric combat attributes coerced during normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Attribute {
    Hp,
    Atk,
    Def,
    CritRate,
    CritDamage,
    Spd,
    Acc,
    Res,
}

impl Attribute {
    /// All attributes in column order.
    pub const ALL: [Attribute; 8] = [
        Attribute::Hp,
        Attribute::Atk,
        Attribute::Def,
        Attribute::CritRate,
        Attribute::CritDamage,
        Attribute::Spd,
        Attribute::Acc,
        Attribute::Res,
    ];

    /// Header name of the attribute column.
    pub fn column(self) -> &'static str {
        match self {
            Attribute::Hp => "HP",
            Attribute::Atk => "ATK",
            Attribute::Def => "DEF",
            Attribute::CritRate => "CritRate",
            Attribute::CritDamage => "CritDamage",
            Attribute::Spd => "SPD",
            Attribute::Acc => "ACC",
            Attribute::Res => "RES",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Attribute values of one champion; `None` marks a missing value.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attributes([Option<f64>; 8]);

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> Option<f64> {
        self.0[attribute.index()]
    }

    pub fn set(&mut self, attribute: Attribute, value: Option<f64>) {
        self.0[attribute.index()] = value;
    }

    /// Builder-style setter used mostly by tests and callers assembling records by hand.
    pub fn with(mut self, attribute: Attribute, value: f64) -> Self {
        self.set(attribute, Some(value));
        self
    }
}

/// One normalized row of the input table.
#[derive(Clone, Debug, PartialEq)]
pub struct Champion {
    pub name: String,
    pub affinity: Option<Affinity>,
    pub attributes: Attributes,
    pub rank: Option<u32>,
    pub level: Option<u32>,
    pub buff_cooldown: f64,
    pub debuff_cooldown: f64,
}

/// Options controlling coercion of raw cells.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizeOptions {
    pub on_invalid: InvalidValuePolicy,
    pub default_buff_cooldown: f64,
    pub default_debuff_cooldown: f64,
}

/// Parses a numeric cell. `Ok(None)` is a missing value, `Err(())` an unparseable one.
fn parse_number(cell: &str) -> std::result::Result<Option<f64>, ()> {
    if is_missing(cell) {
        return Ok(None);
    }
    let cell = cell.trim();
    match cell.parse::<f64>() {
        Ok(value) if value.is_nan() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(_) => Err(()),
    }
}

fn parse_integral(cell: &str) -> Option<i64> {
    let value = parse_number(cell).ok().flatten()?;
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

fn parse_count(cell: &str) -> Option<u32> {
    parse_integral(cell).and_then(|value| u32::try_from(value).ok())
}

struct Coercer {
    policy: InvalidValuePolicy,
    coerced: usize,
}

impl Coercer {
    fn coerce(&mut self, cell: &str, column: &str, row: usize) -> Result<Option<f64>> {
        match parse_number(cell) {
            Ok(value) => Ok(value),
            Err(()) => match self.policy {
                InvalidValuePolicy::Fail => Err(ReportError::InvalidNumber {
                    column: column.to_string(),
                    row: row + 1,
                    value: cell.to_string(),
                }),
                InvalidValuePolicy::Skip => {
                    debug!("Row {}: '{}' in {} treated as missing", row + 1, cell, column);
                    self.coerced += 1;
                    Ok(None)
                }
            },
        }
    }
}

/// Converts every row of `table` into a [`Champion`].
pub fn normalize(table: &RawTable, options: &NormalizeOptions) -> Result<Vec<Champion>> {
    table.ensure_required_columns()?;

    let name_col = table.require_column("Name")?;
    let affinity_col = table.require_column("Affinity")?;
    let rank_col = table.require_column("Rank")?;
    let level_col = table.require_column("Level")?;
    let attribute_cols = Attribute::ALL
        .iter()
        .map(|attribute| Ok((*attribute, table.require_column(attribute.column())?)))
        .collect::<Result<Vec<_>>>()?;
    let buff_col = table.column_index(BUFF_COOLDOWN_COLUMN);
    let debuff_col = table.column_index(DEBUFF_COOLDOWN_COLUMN);

    let mut coercer = Coercer {
        policy: options.on_invalid,
        coerced: 0,
    };
    let mut champions = Vec::with_capacity(table.len());

    for (row_index, row) in table.rows().iter().enumerate() {
        let cell = |column: usize| row.get(column).map(String::as_str).unwrap_or("");

        let mut attributes = Attributes::default();
        for (attribute, column) in &attribute_cols {
            let value = coercer.coerce(cell(*column), attribute.column(), row_index)?;
            attributes.set(*attribute, value);
        }

        let buff_cooldown = match buff_col {
            Some(column) => coercer.coerce(cell(column), BUFF_COOLDOWN_COLUMN, row_index)?,
            None => None,
        };
        let debuff_cooldown = match debuff_col {
            Some(column) => coercer.coerce(cell(column), DEBUFF_COOLDOWN_COLUMN, row_index)?,
            None => None,
        };

        champions.push(Champion {
            name: cell(name_col).to_string(),
            affinity: Affinity::parse(cell(affinity_col)),
            attributes,
            rank: parse_count(cell(rank_col)),
            level: parse_count(cell(level_col)),
            buff_cooldown: buff_cooldown.unwrap_or(options.default_buff_cooldown),
            debuff_cooldown: debuff_cooldown.unwrap_or(options.default_debuff_cooldown),
        });
    }

    if coercer.coerced > 0 {
        warn!(
            "{} invalid numeric value(s) in {} were treated as missing",
            coercer.coerced,
            table.source().display()
        );
    }

    Ok(champions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Name,Affinity,HP,ATK,DEF,CritRate,CritDamage,SPD,ACC,RES,Rank,Level";

    fn options(on_invalid: InvalidValuePolicy) -> NormalizeOptions {
        NormalizeOptions {
            on_invalid,
            default_buff_cooldown: 3.0,
            default_debuff_cooldown: 4.0,
        }
    }

    fn table(body: &str) -> RawTable {
        let csv = format!("{HEADER}\n{body}");
        RawTable::from_reader(csv.as_bytes(), "test.csv").expect("load table")
    }

    #[test]
    fn affinity_codes_map_to_labels() {
        assert_eq!(Affinity::from_code(1), Some(Affinity::Magic));
        assert_eq!(Affinity::from_code(2), Some(Affinity::Force));
        assert_eq!(Affinity::from_code(3), Some(Affinity::Spirit));
        assert_eq!(Affinity::from_code(4), Some(Affinity::Void));
        assert_eq!(Affinity::from_code(0), None);
        assert_eq!(Affinity::from_code(5), None);
        assert_eq!(Affinity::parse("3.0"), Some(Affinity::Spirit));
        assert_eq!(Affinity::parse("2.5"), None);
        assert_eq!(Affinity::parse("fire"), None);
    }

    #[test]
    fn coerces_numeric_columns() {
        let champions = normalize(
            &table("A,1,100,10,50,0.15,0.5,10,10,10,1,10"),
            &options(InvalidValuePolicy::Fail),
        )
        .expect("normalize");
        let champion = &champions[0];
        assert_eq!(champion.name, "A");
        assert_eq!(champion.affinity, Some(Affinity::Magic));
        assert_eq!(champion.attributes.get(Attribute::Hp), Some(100.0));
        assert_eq!(champion.attributes.get(Attribute::CritRate), Some(0.15));
        assert_eq!(champion.rank, Some(1));
        assert_eq!(champion.level, Some(10));
        assert_eq!(champion.buff_cooldown, 3.0);
        assert_eq!(champion.debuff_cooldown, 4.0);
    }

    #[test]
    fn fail_policy_rejects_invalid_numbers() {
        let err = normalize(
            &table("A,1,100,10,50,0,0,10,10,10,1,10\nB,2,abc,10,50,0,0,10,10,10,1,10"),
            &options(InvalidValuePolicy::Fail),
        )
        .unwrap_err();
        match err {
            ReportError::InvalidNumber { column, row, value } => {
                assert_eq!(column, "HP");
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn skip_policy_turns_invalid_numbers_into_missing() {
        let champions = normalize(
            &table("B,2,abc,10,50,0,0,10,10,10,1,10"),
            &options(InvalidValuePolicy::Skip),
        )
        .expect("normalize");
        assert_eq!(champions[0].attributes.get(Attribute::Hp), None);
        assert_eq!(champions[0].attributes.get(Attribute::Def), Some(50.0));
    }

    #[test]
    fn empty_cells_are_missing_under_both_policies() {
        for policy in [InvalidValuePolicy::Fail, InvalidValuePolicy::Skip] {
            let champions = normalize(&table("C,9,,10,50,0,0,10,10,10,x,"), &options(policy))
                .expect("normalize");
            assert_eq!(champions[0].attributes.get(Attribute::Hp), None);
            assert_eq!(champions[0].affinity, None);
            assert_eq!(champions[0].rank, None);
            assert_eq!(champions[0].level, None);
        }
    }

    #[test]
    fn missing_markers_are_not_invalid() {
        let champions = normalize(
            &table("D,NA,N/A,null,NULL,nan,-NaN,10,10,10,<NA>,None"),
            &options(InvalidValuePolicy::Fail),
        )
        .expect("markers are missing values, not errors");
        let champion = &champions[0];
        assert_eq!(champion.affinity, None);
        assert_eq!(champion.attributes.get(Attribute::Hp), None);
        assert_eq!(champion.attributes.get(Attribute::Atk), None);
        assert_eq!(champion.attributes.get(Attribute::CritDamage), None);
        assert_eq!(champion.attributes.get(Attribute::Spd), Some(10.0));
        assert_eq!(champion.rank, None);
        assert_eq!(champion.level, None);
    }

    #[test]
    fn per_record_cooldowns_override_defaults() {
        let csv = format!(
            "{HEADER},Buff_Skill_Cooldown,Debuff_Skill_Cooldown\n\
             A,1,100,10,50,0,0,10,10,10,1,10,2,\n"
        );
        let table = RawTable::from_reader(csv.as_bytes(), "cooldowns.csv").expect("load");
        let champions = normalize(&table, &options(InvalidValuePolicy::Fail)).expect("normalize");
        assert_eq!(champions[0].buff_cooldown, 2.0);
        assert_eq!(champions[0].debuff_cooldown, 4.0);
    }
}
