use anyhow::Result;
use clap::Parser;
use log::LevelFilter;
use picon_gen::picon_gen::{BACKGROUND_DIR_DEFAULT, LOGO_DIR_DEFAULT, OUT_DIR_DEFAULT};
use picon_gen::{generate_picons, Config};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(
    name = "picon-gen",
    version,
    about = "Generate final set of ocram's picons from the channel logos and backgrounds"
)]
struct Args {
    /// Directory containing source logos for ocram's picons
    #[clap(short = 'd', long = "logodir", value_name = "LOGO DIR", default_value = LOGO_DIR_DEFAULT)]
    logo_dir: PathBuf,

    /// Directory containing the background types sub directories
    #[clap(short = 'b', long = "backgrounddir", value_name = "BACKGROUND DIR", default_value = BACKGROUND_DIR_DEFAULT)]
    background_dir: PathBuf,

    /// Base directory for writing the finalized ocram's picons
    #[clap(short = 'o', long = "outdir", value_name = "OUTPUT DIR", default_value = OUT_DIR_DEFAULT)]
    out_dir: PathBuf,

    /// Process only these background types separated by commas, these map to
    /// the subdirectories under the background directory, all by default
    #[clap(short = 't', long = "backgroundtypes", value_name = "TYPE1,TYPE2,...")]
    background_types: Vec<String>,

    /// Process only these background variations separated by commas, these map
    /// to the .png files under the background types directories, all by default
    #[clap(short = 'v', long = "backgroundvariations", value_name = "VARIATION1,VARIATION2,...")]
    background_variations: Vec<String>,

    /// Process only these logos separated by commas, these map to the .png
    /// files under the logo dir, all by default
    #[clap(short = 'l', long = "logos", value_name = "LOGO1,LOGO2,...")]
    logos: Vec<String>,

    /// Force creation of the picons even if a picon already exists and the
    /// corresponding source logo is older than the picon
    #[clap(short = 'f', long)]
    force: bool,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            logo_dir: args.logo_dir,
            background_dir: args.background_dir,
            out_dir: args.out_dir,
            background_types: args.background_types,
            background_variations: args.background_variations,
            logos: args.logos,
            force: args.force,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    generate_picons(&args.into())?;
    Ok(())
}
