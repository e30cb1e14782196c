pub mod crawl;
pub mod report;
pub mod sink;

use colored::Colorize;

const BANNER: &str = r#"
   __           _ _       _
  / _| __ _ _ _| (_)_ __ | | __
 | |_ / _` | '__| | | '_ \| |/ /
 |  _| (_| | |  | | | | | |   <
 |_|  \__,_|_|  |_|_|_| |_|_|\_\
"#;

pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "outbound link explorer".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
