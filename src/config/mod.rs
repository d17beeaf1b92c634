pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::domain::ports::ConfigProvider;
    use crate::utils::error::Result;
    use crate::utils::validation::{
        validate_file_extensions, validate_non_empty_list, validate_non_empty_string,
        validate_path, Validate,
    };
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "declscan")]
    #[command(about = "Scans C++ interface headers and emits a binding manifest")]
    pub struct CliConfig {
        /// Headers to scan, relative to the scan root
        #[arg(long, value_delimiter = ',')]
        pub headers: Vec<String>,

        /// Directories probed when resolving includes
        #[arg(long, value_delimiter = ',')]
        pub include_paths: Vec<String>,

        /// Extra defines, NAME or NAME=VALUE
        #[arg(long, value_delimiter = ',')]
        pub defines: Vec<String>,

        /// Directory all scanned paths are resolved against
        #[arg(long, default_value = ".")]
        pub scan_root: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, default_value = "manifest.json")]
        pub manifest_name: String,

        /// Concrete type substituted for platform time aliases
        #[arg(long, default_value = "time_t")]
        pub platform_time_type: String,

        /// Additional fields exempt from the initialization rule
        #[arg(long, value_delimiter = ',')]
        pub init_exempt: Vec<String>,

        /// Refuse warning-level classifications instead of accepting them
        #[arg(long)]
        pub strict: bool,

        /// Do not log per-entity classification errors
        #[arg(long)]
        pub suppress_errors: bool,

        /// Write the manifest without pretty-printing
        #[arg(long)]
        pub compact: bool,

        /// Enable verbose output
        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,
    }

    impl ConfigProvider for CliConfig {
        fn headers(&self) -> &[String] {
            &self.headers
        }

        fn include_paths(&self) -> &[String] {
            &self.include_paths
        }

        fn defines(&self) -> &[String] {
            &self.defines
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn manifest_name(&self) -> &str {
            &self.manifest_name
        }

        fn pretty(&self) -> bool {
            !self.compact
        }

        fn platform_time_type(&self) -> &str {
            &self.platform_time_type
        }

        fn warnings_allowed(&self) -> bool {
            !self.strict
        }

        fn suppress_errors(&self) -> bool {
            self.suppress_errors
        }

        fn init_exempt_fields(&self) -> &[String] {
            &self.init_exempt
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_non_empty_list("headers", &self.headers)?;
            validate_file_extensions("headers", &self.headers, &["h", "hpp", "hh"])?;
            validate_path("scan_root", &self.scan_root)?;
            validate_path("output_path", &self.output_path)?;
            validate_non_empty_string("manifest_name", &self.manifest_name)?;
            validate_non_empty_string("platform_time_type", &self.platform_time_type)?;
            Ok(())
        }
    }
}
