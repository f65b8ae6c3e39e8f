//! One line of the take log: `scene,num,clipName,select,isDelete`.

use slate_core::{Take, TakeId};

pub const NUM_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("number of columns in record = {found}, want {want}")]
    Columns { found: usize, want: usize },

    #[error("{0:?} is not a boolean value")]
    Bool(String),
}

/// A take record, or a tombstone when `is_delete` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRow {
    pub take: Take,
    pub is_delete: bool,
}

impl LogRow {
    pub fn record(take: Take) -> Self {
        Self {
            take,
            is_delete: false,
        }
    }

    pub fn tombstone(id: TakeId) -> Self {
        Self {
            take: Take {
                id,
                ..Take::default()
            },
            is_delete: true,
        }
    }

    /// Parse a record. On a tombstone only the id columns are interpreted.
    pub fn parse<'a, I>(fields: I) -> Result<Self, RowError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields: Vec<&str> = fields.into_iter().collect();
        let [scene, num, clip_name, select, is_delete] = fields[..] else {
            return Err(RowError::Columns {
                found: fields.len(),
                want: NUM_COLUMNS,
            });
        };
        let id = TakeId::new(scene, num);
        if parse_bool(is_delete)? {
            return Ok(Self::tombstone(id));
        }
        Ok(Self::record(Take {
            id,
            clip_name: clip_name.to_string(),
            select: parse_bool(select)?,
        }))
    }

    pub fn fields(&self) -> [&str; NUM_COLUMNS] {
        [
            &self.take.id.scene,
            &self.take.id.num,
            &self.take.clip_name,
            bool_str(self.take.select),
            bool_str(self.is_delete),
        ]
    }
}

pub fn bool_str(b: bool) -> &'static str {
    if b {
        "TRUE"
    } else {
        "FALSE"
    }
}

pub fn parse_bool(s: &str) -> Result<bool, RowError> {
    match s {
        "1" | "y" | "Y" | "true" | "TRUE" => Ok(true),
        "0" | "n" | "N" | "false" | "FALSE" => Ok(false),
        _ => Err(RowError::Bool(s.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_record() {
        let row = LogRow::parse(["1", "2", "foo", "y", "0"]).unwrap();
        assert_eq!(row, LogRow::record(Take::new(TakeId::new("1", "2"), "foo", true)));
    }

    #[test]
    fn parse_tombstone_ignores_payload() {
        let row = LogRow::parse(["1", "2", "", "", "TRUE"]).unwrap();
        assert_eq!(row, LogRow::tombstone(TakeId::new("1", "2")));
    }

    #[test]
    fn parse_rejects_wrong_column_count() {
        let err = LogRow::parse(["1", "2", "foo", "true"]).unwrap_err();
        assert_eq!(err, RowError::Columns { found: 4, want: 5 });
        assert_eq!(
            err.to_string(),
            "number of columns in record = 4, want 5"
        );
    }

    #[test]
    fn parse_rejects_bad_bool() {
        let err = LogRow::parse(["1", "2", "foo", "maybe", "false"]).unwrap_err();
        assert_eq!(err, RowError::Bool("maybe".into()));
        assert!(LogRow::parse(["1", "2", "foo", "false", "yes"]).is_err());
    }

    #[test]
    fn bools_accept_all_spellings() {
        for s in ["1", "y", "Y", "true", "TRUE"] {
            assert_eq!(parse_bool(s), Ok(true), "{s}");
        }
        for s in ["0", "n", "N", "false", "FALSE"] {
            assert_eq!(parse_bool(s), Ok(false), "{s}");
        }
        assert!(parse_bool("True").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn fields_are_canonical() {
        let row = LogRow::record(Take::new(TakeId::new("4", "1"), "A001", false));
        assert_eq!(row.fields(), ["4", "1", "A001", "FALSE", "FALSE"]);
        let row = LogRow::tombstone(TakeId::new("4", "1"));
        assert_eq!(row.fields(), ["4", "1", "", "FALSE", "TRUE"]);
    }
}
