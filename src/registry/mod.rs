//! Region registry: maps region codes to endpoints
//!
//! A registry is loaded once per run from a CSV table (header row, then
//! `code,name,address` records) and is read-only afterwards.

use crate::{
    error::{AppError, Result},
    models::{Config, Endpoint},
    types::Provider,
};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

const AWS_TABLE: &str = include_str!("../../endpoints/aws.csv");
const GCP_TABLE: &str = include_str!("../../endpoints/gcp.csv");
const AZURE_TABLE: &str = include_str!("../../endpoints/azure.csv");

/// Where the registry for a run comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrySource {
    /// Explicit CSV file
    File(PathBuf),
    /// `<dir>/endpoints/<provider>.csv`
    Directory { root: PathBuf, provider: Provider },
    /// Table compiled into the binary
    Builtin(Provider),
}

impl RegistrySource {
    /// Pick the source for the configured provider. First match wins:
    /// explicit file, then the pingcloud directory, then the built-in table.
    pub fn resolve(config: &Config) -> Self {
        if let Some(file) = &config.endpoints_file {
            return Self::File(file.clone());
        }
        if let Some(root) = &config.endpoints_dir {
            return Self::Directory {
                root: root.clone(),
                provider: config.provider,
            };
        }
        Self::Builtin(config.provider)
    }

    /// Path of the file backing this source, if any
    pub fn path(&self) -> Option<PathBuf> {
        match self {
            Self::File(path) => Some(path.clone()),
            Self::Directory { root, provider } => {
                Some(root.join("endpoints").join(format!("{}.csv", provider.as_str())))
            }
            Self::Builtin(_) => None,
        }
    }

    pub fn describe(&self) -> String {
        match self.path() {
            Some(path) => path.display().to_string(),
            None => match self {
                Self::Builtin(provider) => format!("built-in {} table", provider.as_str()),
                _ => String::from("unknown"),
            },
        }
    }
}

/// Immutable region code → endpoint table, iterated in code order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointRegistry {
    endpoints: BTreeMap<String, Endpoint>,
}

impl EndpointRegistry {
    /// Build from endpoints, rejecting duplicate or empty codes
    pub fn from_endpoints<I>(endpoints: I) -> Result<Self>
    where
        I: IntoIterator<Item = Endpoint>,
    {
        let mut registry = Self::default();
        for endpoint in endpoints {
            registry.insert(endpoint, None)?;
        }
        Ok(registry)
    }

    /// Parse a CSV table. The first record is a header and is skipped.
    pub fn from_csv_str(text: &str) -> Result<Self> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Fields may be double-quoted and are trimmed. Blank lines are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        if reader.headers().map_err(csv_error)?.is_empty() {
            return Err(AppError::config("registry table is empty; expected a header row"));
        }

        let mut registry = Self::default();
        for record in reader.records() {
            let record = record.map_err(csv_error)?;
            let line = record.position().map(|p| p.line() as usize);

            let (code, name, address) = match (record.len(), record.get(0), record.get(1), record.get(2)) {
                (crate::defaults::CSV_COLUMNS, Some(code), Some(name), Some(address)) => (code, name, address),
                (found, ..) => {
                    return Err(AppError::config(format!(
                        "{}expected {} fields (code,name,address), found {}",
                        line_prefix(line),
                        crate::defaults::CSV_COLUMNS,
                        found
                    )))
                }
            };

            registry.insert(Endpoint::new(code, name, address), line)?;
        }

        Ok(registry)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| AppError::config(format!("cannot open registry {}: {}", path.display(), e)))?;
        Self::from_csv_reader(file)
            .map_err(|e| AppError::config(format!("{}: {}", path.display(), strip_category(&e))))
    }

    /// Table compiled into the binary for `provider`
    pub fn builtin(provider: Provider) -> Result<Self> {
        let table = match provider {
            Provider::Aws => AWS_TABLE,
            Provider::Gcp => GCP_TABLE,
            Provider::Azure => AZURE_TABLE,
        };
        Self::from_csv_str(table)
    }

    pub fn load(source: &RegistrySource) -> Result<Self> {
        match (source, source.path()) {
            (RegistrySource::Builtin(provider), _) => Self::builtin(*provider),
            (_, Some(path)) => Self::from_csv_path(&path),
            (_, None) => Err(AppError::internal(format!("registry source {:?} has no path", source))),
        }
    }

    pub fn get(&self, code: &str) -> Option<&Endpoint> {
        self.endpoints.get(code)
    }

    /// Endpoints in ascending region-code order
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.values()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    fn insert(&mut self, endpoint: Endpoint, line: Option<usize>) -> Result<()> {
        let at = line_prefix(line);

        if endpoint.code.is_empty() {
            return Err(AppError::config(format!("{}region code cannot be empty", at)));
        }
        if self.endpoints.contains_key(&endpoint.code) {
            return Err(AppError::config(format!("{}duplicate region code '{}'", at, endpoint.code)));
        }

        self.endpoints.insert(endpoint.code.clone(), endpoint);
        Ok(())
    }
}

fn line_prefix(line: Option<usize>) -> String {
    line.map(|l| format!("line {}: ", l)).unwrap_or_default()
}

fn csv_error(error: csv::Error) -> AppError {
    let line = error.position().map(|p| p.line() as usize);
    let message = match error.into_kind() {
        csv::ErrorKind::Io(e) => format!("failed to read registry: {}", e),
        csv::ErrorKind::Utf8 { err, .. } => format!("invalid UTF-8 in field {}", err.field() + 1),
        other => format!("malformed table: {:?}", other),
    };
    AppError::config(format!("{}{}", line_prefix(line), message))
}

fn strip_category(error: &AppError) -> String {
    match error {
        AppError::Config(message) => message.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const TWO_ROWS: &str = "region,name,address\n\
        us-east-1,US East (N. Virginia),https://dynamodb.us-east-1.amazonaws.com/ping\n\
        eu-west-1,\"Europe (Ireland)\",https://dynamodb.eu-west-1.amazonaws.com/ping\n";

    #[test]
    fn test_header_is_skipped() {
        let registry = EndpointRegistry::from_csv_str(TWO_ROWS).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("region").is_none());

        let endpoint = registry.get("eu-west-1").unwrap();
        assert_eq!(endpoint.name, "Europe (Ireland)");
        assert_eq!(endpoint.address, "https://dynamodb.eu-west-1.amazonaws.com/ping");
    }

    #[test]
    fn test_iteration_is_sorted_by_code() {
        let registry = EndpointRegistry::from_csv_str(TWO_ROWS).unwrap();
        let codes: Vec<&str> = registry.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["eu-west-1", "us-east-1"]);
    }

    #[test]
    fn test_header_only_is_empty_and_valid() {
        let registry = EndpointRegistry::from_csv_str("region,name,address\n").unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_source_is_rejected() {
        assert!(EndpointRegistry::from_csv_str("").is_err());
        assert!(EndpointRegistry::from_csv_str("\n\n").is_err());
    }

    #[test]
    fn test_quoted_fields_and_crlf() {
        let table = "region,name,address\r\n\
            \r\n\
            ap-northeast-2 ,\"Asia Pacific (Seoul), KR\",https://dynamodb.ap-northeast-2.amazonaws.com/ping\r\n\
            eu-west-2,\"London \"\"Docklands\"\"\",https://dynamodb.eu-west-2.amazonaws.com/ping";
        let registry = EndpointRegistry::from_csv_str(table).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("ap-northeast-2").unwrap().name, "Asia Pacific (Seoul), KR");
        assert_eq!(registry.get("eu-west-2").unwrap().name, "London \"Docklands\"");
    }

    #[test]
    fn test_line_numbers_count_quoted_line_breaks() {
        let error = EndpointRegistry::from_csv_str("h,h,h\na,\"two\nlines\",c\nd,e\n").unwrap_err();
        assert!(error.to_string().contains("line 4"), "{}", error);
    }

    #[test]
    fn test_empty_code_names_line() {
        let error = EndpointRegistry::from_csv_str("h,h,h\n\"\",b,c\n").unwrap_err();
        assert!(error.to_string().contains("line 2: region code cannot be empty"));
    }

    #[test]
    fn test_wrong_field_count_names_line() {
        let error = EndpointRegistry::from_csv_str("h,h,h\na,b,c\nd,e\n").unwrap_err();
        assert_eq!(error.category(), "CONFIG");
        assert!(error.to_string().contains("line 3"));

        assert!(EndpointRegistry::from_csv_str("h,h,h\na,b,c,d\n").is_err());
    }

    #[test]
    fn test_duplicate_code_is_rejected() {
        let error = EndpointRegistry::from_csv_str("h,h,h\na,b,c\na,x,y\n").unwrap_err();
        assert!(error.to_string().contains("duplicate region code 'a'"));
    }

    #[test]
    fn test_builtin_tables_load() {
        for provider in [Provider::Aws, Provider::Gcp, Provider::Azure] {
            let registry = EndpointRegistry::builtin(provider).unwrap();
            assert!(!registry.is_empty());
            assert!(registry.get(provider.example_region()).is_some());
            for endpoint in registry.iter() {
                let url = url::Url::parse(&endpoint.address).unwrap();
                assert!(matches!(url.scheme(), "http" | "https"));
            }
        }
    }

    #[test]
    fn test_from_csv_path() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(TWO_ROWS.as_bytes()).unwrap();
        let registry = EndpointRegistry::from_csv_path(file.path()).unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let error = EndpointRegistry::from_csv_path(Path::new("/nonexistent/endpoints.csv")).unwrap_err();
        assert_eq!(error.category(), "CONFIG");
    }

    #[test]
    fn test_source_resolution_order() {
        let mut config = Config::default();
        config.provider = Provider::Gcp;
        assert_eq!(RegistrySource::resolve(&config), RegistrySource::Builtin(Provider::Gcp));

        config.endpoints_dir = Some(PathBuf::from("/opt/pingcloud"));
        let source = RegistrySource::resolve(&config);
        assert_eq!(source.path(), Some(PathBuf::from("/opt/pingcloud/endpoints/gcp.csv")));

        config.endpoints_file = Some(PathBuf::from("custom.csv"));
        assert_eq!(RegistrySource::resolve(&config), RegistrySource::File(PathBuf::from("custom.csv")));
    }

    #[test]
    fn test_directory_source_loads_provider_file() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("endpoints")).unwrap();
        std::fs::write(dir.path().join("endpoints").join("azure.csv"), TWO_ROWS).unwrap();

        let source = RegistrySource::Directory {
            root: dir.path().to_path_buf(),
            provider: Provider::Azure,
        };
        assert_eq!(EndpointRegistry::load(&source).unwrap().len(), 2);

        let missing = RegistrySource::Directory {
            root: dir.path().to_path_buf(),
            provider: Provider::Aws,
        };
        assert!(EndpointRegistry::load(&missing).is_err());
    }

    #[test]
    fn test_from_endpoints_rejects_duplicates() {
        let endpoint = Endpoint::new("us-east-1", "US East", "https://example.com");
        assert!(EndpointRegistry::from_endpoints(vec![endpoint.clone(), endpoint]).is_err());
    }
}
