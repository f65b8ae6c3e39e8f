use crate::row::bool_str;
use slate_core::Take;
use std::io::Write;

pub const EXPORT_HEADER: [&str; 4] = ["Scene", "Take", "Clip Name", "Select"];

/// Write `takes` as a spreadsheet-friendly CSV with a header row.
pub fn write_takes_csv<W: Write>(takes: &[Take], w: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(w);
    wtr.write_record(EXPORT_HEADER)?;
    for t in takes {
        wtr.write_record([
            t.id.scene.as_str(),
            t.id.num.as_str(),
            t.clip_name.as_str(),
            bool_str(t.select),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slate_core::TakeId;

    #[test]
    fn export_has_header_and_rows() {
        let takes = vec![
            Take::new(TakeId::new("1", "1"), "A001C001", true),
            Take::new(TakeId::new("1", "2"), "A001, C002", false),
        ];
        let mut out = Vec::new();
        write_takes_csv(&takes, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Scene,Take,Clip Name,Select\n1,1,A001C001,TRUE\n1,2,\"A001, C002\",FALSE\n"
        );
    }
}
