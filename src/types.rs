use crate::error::{HenError, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A process stream defined by inlet/outlet temperatures and a
/// flow-rate heat-capacity product. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    tin: Decimal,
    tout: Decimal,
    fcp: Decimal,
}

impl Stream {
    /// Create a process stream, validating its definition
    pub fn new(tin: Decimal, tout: Decimal, fcp: Decimal) -> Result<Self> {
        if tin == tout {
            return Err(HenError::InvalidStream {
                tin,
                tout,
                fcp,
                reason: "inlet and outlet temperatures are equal".to_string(),
            });
        }
        if fcp <= Decimal::ZERO {
            return Err(HenError::InvalidStream {
                tin,
                tout,
                fcp,
                reason: "heat-capacity flow rate must be positive".to_string(),
            });
        }
        Ok(Stream { tin, tout, fcp })
    }

    pub fn tin(&self) -> Decimal {
        self.tin
    }

    pub fn tout(&self) -> Decimal {
        self.tout
    }

    pub fn fcp(&self) -> Decimal {
        self.fcp
    }

    /// A stream is hot when it must be cooled
    pub fn is_hot(&self) -> bool {
        self.tin > self.tout
    }

    /// Total duty: |Tout - Tin| * FCp
    pub fn heat(&self) -> Decimal {
        (self.tout - self.tin).abs() * self.fcp
    }
}

/// A utility stream: temperature levels only, duty determined by the
/// minimum-utility solve rather than fixed a priori
#[derive(Debug, Clone, PartialEq)]
pub struct Utility {
    tin: Decimal,
    tout: Decimal,
}

impl Utility {
    pub fn new(tin: Decimal, tout: Decimal) -> Result<Self> {
        if tin == tout {
            return Err(HenError::InvalidStream {
                tin,
                tout,
                fcp: Decimal::ZERO,
                reason: "utility inlet and outlet temperatures are equal".to_string(),
            });
        }
        Ok(Utility { tin, tout })
    }

    pub fn tin(&self) -> Decimal {
        self.tin
    }

    pub fn tout(&self) -> Decimal {
        self.tout
    }

    pub fn is_hot(&self) -> bool {
        self.tin > self.tout
    }
}

/// One named problem instance as returned by a data source
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemData {
    pub streams: Vec<Stream>,
    pub hot_utility: Utility,
    pub cold_utility: Utility,
    pub dt_min: Decimal,
}

/// Data source for named problem instances. Injected into the problem
/// constructor so instances are testable in isolation and multiple
/// sources can coexist.
pub trait ProblemSource {
    fn load(&self, id: &str) -> Result<ProblemData>;
}

/// In-memory problem source backed by a map
#[derive(Default, Debug, Clone)]
pub struct InMemorySource {
    problems: HashMap<String, ProblemData>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a problem instance under an identifier
    pub fn with_problem(mut self, id: impl Into<String>, data: ProblemData) -> Self {
        self.problems.insert(id.into(), data);
        self
    }

    pub fn len(&self) -> usize {
        self.problems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

impl ProblemSource for InMemorySource {
    fn load(&self, id: &str) -> Result<ProblemData> {
        self.problems
            .get(id)
            .cloned()
            .ok_or_else(|| HenError::UnknownProblem { id: id.to_string() })
    }
}

#[cfg(feature = "csv")]
mod csv_support {
    use super::*;
    use serde::{Deserialize, Deserializer};
    use std::path::PathBuf;

    fn deserialize_na_option<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        let s = String::deserialize(deserializer)?;
        if s == "NA" || s.is_empty() {
            Ok(None)
        } else {
            s.parse::<T>().map(Some).map_err(serde::de::Error::custom)
        }
    }

    #[derive(Debug, Deserialize)]
    struct StreamRecord {
        #[serde(rename = "Role")]
        role: String,
        #[serde(rename = "Tin")]
        tin: Decimal,
        #[serde(rename = "Tout")]
        tout: Decimal,
        #[serde(rename = "FCp", deserialize_with = "deserialize_na_option")]
        fcp: Option<Decimal>,
        #[serde(rename = "DTmin", deserialize_with = "deserialize_na_option")]
        dt_min: Option<Decimal>,
    }

    /// Problem source reading `<dir>/<id>.csv`. Rows carry a Role column
    /// (Stream, HotUtility, ColdUtility); DTmin is taken from the first
    /// row that carries one; utility rows use FCp = NA.
    #[derive(Debug, Clone)]
    pub struct CsvProblemSource {
        dir: PathBuf,
    }

    impl CsvProblemSource {
        pub fn new(dir: impl Into<PathBuf>) -> Self {
            CsvProblemSource { dir: dir.into() }
        }
    }

    impl ProblemSource for CsvProblemSource {
        fn load(&self, id: &str) -> Result<ProblemData> {
            let path = self.dir.join(format!("{id}.csv"));
            if !path.exists() {
                return Err(HenError::UnknownProblem { id: id.to_string() });
            }

            let mut reader = csv::Reader::from_path(&path)
                .map_err(|e| HenError::DataSource(e.to_string()))?;

            let mut streams = Vec::new();
            let mut hot_utility = None;
            let mut cold_utility = None;
            let mut dt_min = None;

            for result in reader.deserialize() {
                let record: StreamRecord =
                    result.map_err(|e| HenError::DataSource(e.to_string()))?;

                if dt_min.is_none() {
                    dt_min = record.dt_min;
                }

                match record.role.as_str() {
                    "Stream" => {
                        let fcp = record.fcp.ok_or_else(|| {
                            HenError::DataSource(format!("process stream in {id} without FCp"))
                        })?;
                        streams.push(Stream::new(record.tin, record.tout, fcp)?);
                    }
                    "HotUtility" => {
                        hot_utility = Some(Utility::new(record.tin, record.tout)?);
                    }
                    "ColdUtility" => {
                        cold_utility = Some(Utility::new(record.tin, record.tout)?);
                    }
                    other => {
                        return Err(HenError::DataSource(format!(
                            "unrecognized stream role {other} in {id}"
                        )));
                    }
                }
            }

            let hot_utility = hot_utility
                .ok_or_else(|| HenError::DataSource(format!("{id} defines no hot utility")))?;
            let cold_utility = cold_utility
                .ok_or_else(|| HenError::DataSource(format!("{id} defines no cold utility")))?;
            let dt_min =
                dt_min.ok_or_else(|| HenError::DataSource(format!("{id} defines no DTmin")))?;

            Ok(ProblemData {
                streams,
                hot_utility,
                cold_utility,
                dt_min,
            })
        }
    }
}

#[cfg(feature = "csv")]
pub use csv_support::CsvProblemSource;
