use chrono::prelude::*;
use log::{debug, info};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
pub mod chart;
pub mod error;
pub mod plot;
pub mod timestamp;

pub use chart::TickMode;
pub use error::{Error, Result};
pub use timestamp::fix_timestamp;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const DEFAULT_CSV: &str = "geotab_com_summary_updated.csv";
pub const DEFAULT_PNG: &str = "elapsed_time_plot.png";

pub const COL_TIME: usize = 0;
pub const COL_PREVIOUS: usize = 4;
pub const COL_ELAPSED: usize = 5;
pub const MIN_FIELDS: usize = 6;

/// The main struct for the request latency time series,
/// one entry per csv row in each of the three vectors
#[derive(Debug, Clone, PartialEq)]
pub struct TimeLatency {
    pub time: Vec<Option<NaiveTime>>,
    pub previous: Vec<f64>,
    pub elapsed: Vec<f64>,
}

/// count, min, max and mean of a duration column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatencySummary {
    pub previous: Option<ColumnSummary>,
    pub elapsed: Option<ColumnSummary>,
}

impl TimeLatency {
    pub fn new(capacity: usize) -> TimeLatency {
        TimeLatency {
            time: Vec::with_capacity(capacity),
            previous: Vec::with_capacity(capacity),
            elapsed: Vec::with_capacity(capacity),
        }
    }

    /// Init a TimeLatency from csv at the given path, see from_reader
    pub fn from_csv<P: AsRef<Path>>(fin: P) -> Result<TimeLatency> {
        let file = File::open(fin.as_ref())?;
        info!("reading {}", fin.as_ref().display());
        TimeLatency::from_reader(BufReader::new(file))
    }

    /// Init a TimeLatency from headerless csv, one record at a time.
    /// Unparsable timestamps become None and the row is kept;
    /// short rows and unparsable durations abort the whole load.
    pub fn from_reader<R: Read>(rdr: R) -> Result<TimeLatency> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(rdr);
        let mut timelatency = TimeLatency::new(1000);
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() < MIN_FIELDS {
                return Err(Error::ShortRow {
                    line,
                    fields: record.len(),
                });
            }
            let t = fix_timestamp(&record[COL_TIME]);
            if t.is_none() {
                debug!("line {}: invalid timestamp {:?}", line, &record[COL_TIME]);
            }
            let previous = parse_duration(&record[COL_PREVIOUS], line, COL_PREVIOUS)?;
            let elapsed = parse_duration(&record[COL_ELAPSED], line, COL_ELAPSED)?;
            timelatency.time.push(t);
            timelatency.previous.push(previous);
            timelatency.elapsed.push(elapsed);
        }
        info!(
            "loaded {} rows, {} without valid timestamp",
            timelatency.len(),
            timelatency.missing_times()
        );
        Ok(timelatency)
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// number of rows whose timestamp could not be repaired
    pub fn missing_times(&self) -> usize {
        self.time.iter().filter(|t| t.is_none()).count()
    }

    /// earliest and latest valid timestamp, None if there is none
    pub fn time_span(&self) -> Option<(NaiveTime, NaiveTime)> {
        let present: Vec<NaiveTime> = self.time.iter().flatten().copied().collect();
        min_and_max(&present[..])
    }

    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            previous: ColumnSummary::from_values(&self.previous[..]),
            elapsed: ColumnSummary::from_values(&self.elapsed[..]),
        }
    }
}

impl ColumnSummary {
    /// None for an empty column
    pub fn from_values(v: &[f64]) -> Option<ColumnSummary> {
        let (min, max) = min_and_max(v)?;
        let mean = v.iter().sum::<f64>() / v.len() as f64;
        Some(ColumnSummary {
            count: v.len(),
            min,
            max,
            mean,
        })
    }
}

impl std::fmt::Display for ColumnSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "n={} min={:.2} max={:.2} mean={:.2}",
            self.count, self.min, self.max, self.mean
        )
    }
}

impl std::fmt::Display for TimeLatency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "time,previous_ms,elapsed_ms")?;
        for ((t, p), e) in self
            .time
            .iter()
            .zip(self.previous.iter())
            .zip(self.elapsed.iter())
        {
            match t {
                Some(t) => writeln!(f, "{},{},{}", t.format("%H:%M:%S%.6f"), p, e)?,
                None => writeln!(f, ",{},{}", p, e)?,
            }
        }
        Ok(())
    }
}

fn parse_duration(field: &str, line: u64, column: usize) -> Result<f64> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::ParseDuration {
            line,
            column,
            value: field.to_string(),
        })
}

/// min and max of a slice, None if empty
pub fn min_and_max<T: std::cmp::PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut self_iter = s.iter();
    let (mut min, mut max) = match self_iter.next() {
        Some(v) => (*v, *v),
        None => return None,
    };
    for es in self_iter {
        if *es > max {
            max = *es
        }
        if *es < min {
            min = *es
        }
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
13:45:07:123Z,geotab,matrix,10,512.5,480.25
13:45:12:456Z,geotab,matrix,10,600,999
garbage,geotab,matrix,10,700.75,650
";

    #[test]
    fn three_rows_aligned() {
        let tl = TimeLatency::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(tl.len(), 3);
        assert_eq!(tl.previous, vec![512.5, 600., 700.75]);
        assert_eq!(tl.elapsed, vec![480.25, 999., 650.]);
        assert_eq!(
            tl.time[0],
            Some(NaiveTime::from_hms_milli_opt(13, 45, 7, 123).unwrap())
        );
        assert_eq!(
            tl.time[1],
            Some(NaiveTime::from_hms_milli_opt(13, 45, 12, 456).unwrap())
        );
        assert_eq!(tl.time[2], None);
        assert_eq!(tl.missing_times(), 1);
    }

    #[test]
    fn non_numeric_duration_fails() {
        let data = "13:45:07:123Z,a,b,c,N/A,480\n";
        match TimeLatency::from_reader(data.as_bytes()) {
            Err(Error::ParseDuration { line, column, value }) => {
                assert_eq!(line, 1);
                assert_eq!(column, COL_PREVIOUS);
                assert_eq!(value, "N/A");
            }
            other => panic!("unexpected result {:?}", other),
        }
        let data = "13:45:07:123Z,a,b,c,1,2\n13:45:08:000Z,a,b,c,1,oops\n";
        match TimeLatency::from_reader(data.as_bytes()) {
            Err(Error::ParseDuration { line, column, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(column, COL_ELAPSED);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn short_row_fails() {
        let data = "13:45:07:123Z,a,b,c,1,2\n13:45:07:123Z,a,b,c,1\n";
        match TimeLatency::from_reader(data.as_bytes()) {
            Err(Error::ShortRow { line, fields }) => {
                assert_eq!(line, 2);
                assert_eq!(fields, 5);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn extra_fields_and_spaces_are_accepted() {
        let data = "13:45:07:123Z,a,b,c, 1.5 ,2e3,extra,fields\n";
        let tl = TimeLatency::from_reader(data.as_bytes()).unwrap();
        assert_eq!(tl.previous, vec![1.5]);
        assert_eq!(tl.elapsed, vec![2000.]);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let data = "13:45:07:123Z,a,b,c,1,2\n\n\n13:45:08:000Z,a,b,c,3,4\n\n";
        let tl = TimeLatency::from_reader(data.as_bytes()).unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.previous, vec![1., 3.]);
        assert_eq!(tl.elapsed, vec![2., 4.]);
    }

    #[test]
    fn empty_input_is_empty_series() {
        let tl = TimeLatency::from_reader("".as_bytes()).unwrap();
        assert!(tl.is_empty());
        assert_eq!(tl.time_span(), None);
        assert_eq!(tl.summary().elapsed, None);
    }

    #[test]
    fn span_ignores_missing_times() {
        let tl = TimeLatency::from_reader(SAMPLE.as_bytes()).unwrap();
        let (first, last) = tl.time_span().unwrap();
        assert_eq!(first, NaiveTime::from_hms_milli_opt(13, 45, 7, 123).unwrap());
        assert_eq!(last, NaiveTime::from_hms_milli_opt(13, 45, 12, 456).unwrap());
    }

    #[test]
    fn summary_of_columns() {
        let tl = TimeLatency::from_reader(SAMPLE.as_bytes()).unwrap();
        let s = tl.summary().previous.unwrap();
        assert_eq!(s.count, 3);
        assert_eq!(s.min, 512.5);
        assert_eq!(s.max, 700.75);
        assert!((s.mean - 604.4166).abs() < 1e-3);
    }

    #[test]
    fn display_as_csv() {
        let tl = TimeLatency::from_reader(SAMPLE.as_bytes()).unwrap();
        let out = tl.to_string();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "time,previous_ms,elapsed_ms");
        assert_eq!(lines[1], "13:45:07.123000,512.5,480.25");
        assert_eq!(lines[3], ",700.75,650");
    }

    #[test]
    fn missing_file_is_io_error() {
        let r = TimeLatency::from_csv("this/file/does/not/exist.csv");
        assert!(matches!(r, Err(Error::Io(_))));
    }

    #[test]
    fn min_and_max_of_slice() {
        assert_eq!(min_and_max(&[3., 1., 2.]), Some((1., 3.)));
        assert_eq!(min_and_max::<f64>(&[]), None);
    }
}
