use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use reqwest::{Client, RequestBuilder};

#[derive(Parser)]
#[command(name = "hfv-cli")]
#[command(about = "Hotfix viewer CLI", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    endpoint: String,

    /// Sent as the Hostname header on search requests
    #[arg(long, env = "HOSTNAME")]
    hostname: Option<String>,

    /// Sent as the NTNET header on search requests
    #[arg(long)]
    ntnet: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search hotfixes
    Search {
        #[command(flatten)]
        filter: FilterArgs,

        /// Page number (zero-based); omit for all results
        #[arg(short, long)]
        page: Option<i64>,

        #[arg(short = 's', long, default_value = "20")]
        page_size: i64,
    },

    /// Count matching hotfixes
    Count {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// List known versions
    Versions,

    /// List known modules
    Modules,

    /// Hotfixes rolled into a later hotfix
    Underlying {
        #[arg(value_name = "LATEST_ECP")]
        latest_ecp: String,
    },

    /// Get hotfix details
    Get {
        #[arg(value_name = "ECP_NO")]
        ecp_no: String,
    },

    /// Catalog and usage statistics
    Summary,

    /// Usage log entries, newest first
    Usage {
        #[arg(long)]
        host: Option<String>,
    },

    /// Reload the catalog from its source
    Reload,

    /// Check server health
    Health,
}

#[derive(Args, Default)]
struct FilterArgs {
    #[arg(long)]
    ecp_no: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Exact version; repeat or comma-separate for several
    #[arg(short = 'V', long = "version")]
    versions: Vec<String>,

    #[arg(long)]
    latest_ecp: Option<String>,

    #[arg(long)]
    requestor: Option<String>,

    #[arg(long)]
    fixed_by: Option<String>,

    /// Exact module; repeat or comma-separate for several
    #[arg(short = 'm', long = "module")]
    modules: Vec<String>,

    #[arg(long)]
    case_or_cr_no: Option<String>,

    #[arg(long)]
    files_modified_in_perforce: Option<String>,

    #[arg(long)]
    files_released_to_customer: Option<String>,

    #[arg(long)]
    rolled_into_version: Option<String>,

    #[arg(long)]
    specific_function: Option<String>,
}

impl FilterArgs {
    fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let text = [
            ("ecpNo", &self.ecp_no),
            ("description", &self.description),
            ("latestEcp", &self.latest_ecp),
            ("requestor", &self.requestor),
            ("fixedBy", &self.fixed_by),
            ("caseOrCrNo", &self.case_or_cr_no),
            ("filesModifiedInPerforce", &self.files_modified_in_perforce),
            ("filesReleasedToCustomer", &self.files_released_to_customer),
            ("rolledIntoVersion", &self.rolled_into_version),
            ("specificFunc", &self.specific_function),
        ];

        let mut pairs: Vec<(&'static str, String)> = text
            .into_iter()
            .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
            .collect();
        pairs.extend(self.versions.iter().map(|v| ("cramerVersion", v.clone())));
        pairs.extend(self.modules.iter().map(|m| ("module", m.clone())));
        pairs
    }
}

struct HotfixClient {
    client: Client,
    base: String,
    hostname: Option<String>,
    ntnet: Option<String>,
}

impl HotfixClient {
    fn get(&self, path: &str) -> RequestBuilder {
        let mut request = self.client.get(format!("{}/HFLogViewer{}", self.base, path));
        if let Some(hostname) = &self.hostname {
            request = request.header("Hostname", hostname);
        }
        if let Some(ntnet) = &self.ntnet {
            request = request.header("NTNET", ntnet);
        }
        request
    }
}

async fn print_response(request: RequestBuilder) -> anyhow::Result<()> {
    let response = request.send().await.context("request failed")?;
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .with_context(|| format!("invalid JSON in {} response", status))?;

    println!("{}", serde_json::to_string_pretty(&body)?);
    if !status.is_success() {
        anyhow::bail!("server returned {}", status);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let endpoint = cli.endpoint.trim_end_matches('/').to_string();
    let hotfixes = HotfixClient {
        client: Client::new(),
        base: endpoint.clone(),
        hostname: cli.hostname,
        ntnet: cli.ntnet,
    };

    match cli.command {
        Commands::Search {
            filter,
            page,
            page_size,
        } => {
            let mut query = filter.to_pairs();
            let request = match page {
                Some(page) => {
                    query.push(("page_no", page.to_string()));
                    query.push(("page_size", page_size.to_string()));
                    hotfixes.get("/getPageableResult")
                }
                None => hotfixes.get("/getAllResults"),
            };
            print_response(request.query(&query)).await?;
        }

        Commands::Count { filter } => {
            print_response(hotfixes.get("/getTotalCountAllResults").query(&filter.to_pairs())).await?;
        }

        Commands::Versions => {
            print_response(hotfixes.get("/getDistinctCramerVersions")).await?;
        }

        Commands::Modules => {
            print_response(hotfixes.get("/getDistinctModules")).await?;
        }

        Commands::Underlying { latest_ecp } => {
            print_response(hotfixes.get("/getUnderlyingHFs").query(&[("latestEcp", latest_ecp)])).await?;
        }

        Commands::Get { ecp_no } => {
            print_response(hotfixes.get("/getHotfix").query(&[("ecpNo", ecp_no)])).await?;
        }

        Commands::Summary => {
            print_response(hotfixes.get("/getSummary")).await?;
        }

        Commands::Usage { host } => {
            let mut request = hotfixes.get("/getUserDetails");
            if let Some(host) = host {
                request = request.query(&[("host", host)]);
            }
            print_response(request).await?;
        }

        Commands::Reload => {
            let request = hotfixes
                .client
                .post(format!("{}/HFLogViewer/reload", endpoint));
            print_response(request).await?;
        }

        Commands::Health => {
            print_response(hotfixes.client.get(format!("{}/health", endpoint))).await?;
        }
    }

    Ok(())
}
