use crate::consts::{
    FUNCTIONS_DEFAULT_NAMESPACE, FUNCTIONS_NAMESPACE_ENV_VAR, LISTEN_ADDRESS_ENV_VAR,
    LISTEN_DEFAULT_ADDRESS,
};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serves the function scale and update endpoints
    #[clap(visible_alias = "r")]
    Run {
        /// The namespace for OpenFaaS functions
        #[clap(short = 'n', long, env = FUNCTIONS_NAMESPACE_ENV_VAR, default_value = FUNCTIONS_DEFAULT_NAMESPACE)]
        functions_namespace: String,
        /// The address to listen on
        #[clap(short, long, env = LISTEN_ADDRESS_ENV_VAR, default_value = LISTEN_DEFAULT_ADDRESS)]
        address: SocketAddr,
    },
}
