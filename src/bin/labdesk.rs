use clap::{Arg, ArgMatches, Command};
use std::io::{self, BufRead, Write};

use labdesk::auth::{OAuthSignInOptions, SignInMethod, NOTICE_MAGIC_LINK_SENT, NOTICE_OTP_SENT};
use labdesk::booking::BookingForm;
use labdesk::catalog::{Catalog, CONTACT, NO_RESULTS_HINT};
use labdesk::config::{LabConfig, LabOptions};
use labdesk::portal::PortalView;
use labdesk::{policy, LabDesk};

type CliResult = Result<(), Box<dyn std::error::Error>>;

fn cli() -> Command<'static> {
    Command::new("labdesk")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Bagree Diagnostic Centre portal from the command line")
        .subcommand_required(true)
        .subcommand(
            Command::new("search")
                .about("Search the test catalog")
                .arg(Arg::new("query").help("Text to look for in test names and descriptions")),
        )
        .subcommand(Command::new("rates").about("Print the rate list link and contact details"))
        .subcommand(
            Command::new("book")
                .about("Book an appointment or home collection")
                .arg(Arg::new("name").long("name").takes_value(true).help("Patient name"))
                .arg(Arg::new("phone").long("phone").takes_value(true).help("Phone (10 digits)"))
                .arg(Arg::new("email").long("email").takes_value(true).help("Email (optional)"))
                .arg(Arg::new("date").long("date").takes_value(true).help("Date, YYYY-MM-DD"))
                .arg(Arg::new("time").long("time").takes_value(true).help("Time, HH:MM"))
                .arg(Arg::new("test").long("test").takes_value(true).help("Test name or catalog number")),
        )
        .subcommand(
            Command::new("login")
                .about("Sign in with the configured method and show the dashboard")
                .arg(Arg::new("phone").long("phone").takes_value(true))
                .arg(Arg::new("email").long("email").takes_value(true))
                .arg(Arg::new("redirect-to").long("redirect-to").takes_value(true)),
        )
        .subcommand(Command::new("policies").about("Print the row-level security script"))
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(err) = run(cli().get_matches()).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run(matches: ArgMatches) -> CliResult {
    match matches.subcommand() {
        Some(("search", args)) => search(args.value_of("query").unwrap_or("")),
        Some(("rates", _)) => rates(),
        Some(("book", args)) => book(args).await,
        Some(("login", args)) => login(args).await,
        Some(("policies", _)) => {
            print!("{}", policy::render_script(&options_or_default()));
            Ok(())
        }
        _ => Ok(()),
    }
}

fn options_or_default() -> LabOptions {
    LabConfig::from_env().map(|c| c.options).unwrap_or_default()
}

fn search(query: &str) -> CliResult {
    let catalog = Catalog::sample();
    let hits = catalog.search(query);
    if hits.is_empty() {
        println!("{}", NO_RESULTS_HINT);
    }
    for service in hits {
        println!("{:>2}  {:<30} {:>7}  {}", service.id, service.name, service.price_label(), service.description);
    }
    Ok(())
}

fn rates() -> CliResult {
    let options = options_or_default();
    println!("Rate list (PDF): {}", labdesk::catalog::rate_list_url(&options.site_url));
    println!();
    println!("{}", CONTACT.name);
    for line in CONTACT.address {
        println!("{}", line);
    }
    println!("Phone: {}", CONTACT.phone);
    println!("Email: {}", CONTACT.email);
    Ok(())
}

async fn book(args: &ArgMatches) -> CliResult {
    let desk = LabDesk::from_config(LabConfig::from_env()?)?;

    let field = |name: &str| args.value_of(name).unwrap_or("").to_string();
    let mut form = BookingForm {
        name: field("name"),
        phone: field("phone"),
        email: field("email"),
        date: field("date"),
        time: field("time"),
        ..BookingForm::default()
    };

    if let Some(test) = args.value_of("test") {
        let service = test
            .parse::<u32>()
            .ok()
            .and_then(|id| desk.catalog().find(id))
            .or_else(|| desk.catalog().find_by_name(test));
        match service {
            Some(service) => form.select_service(service),
            None => form.test = test.to_string(),
        }
    }

    let result = desk.booking().submit(&mut form).await;
    println!("{}", form.message);
    result.map(|_| ()).map_err(Into::into)
}

async fn login(args: &ArgMatches) -> CliResult {
    let desk = LabDesk::from_config(LabConfig::from_env()?)?;
    let auth = desk.auth();
    let mut events = auth.on_auth_state_change();
    let mut portal = desk.portal();

    match desk.options().sign_in_method {
        SignInMethod::PhoneOtp => {
            let phone = args.value_of("phone").unwrap_or("");
            auth.send_phone_otp(phone).await?;
            println!("{}", NOTICE_OTP_SENT);
            let code = prompt("OTP: ")?;
            auth.verify_phone_otp(phone, &code).await?;
        }
        SignInMethod::EmailMagicLink => {
            let email = args.value_of("email").unwrap_or("");
            auth.send_magic_link(email, args.value_of("redirect-to")).await?;
            println!("{}", NOTICE_MAGIC_LINK_SENT);
            let answer = prompt("Paste the link you were sent, or the code in it: ")?;
            if answer.starts_with("http") {
                auth.session_from_redirect(&answer)?;
            } else {
                auth.verify_email_otp(email, &answer).await?;
            }
        }
        SignInMethod::OAuth(provider) => {
            let options = OAuthSignInOptions {
                redirect_to: args.value_of("redirect-to").map(str::to_string),
                ..OAuthSignInOptions::default()
            };
            println!("Open in a browser: {}", auth.oauth_sign_in_url(provider, Some(options)));
            let redirect = prompt("Paste the URL you were redirected to: ")?;
            auth.session_from_redirect(&redirect)?;
        }
    }

    portal.sync(&mut events).await?;
    if let Some(notice) = portal.notice() {
        println!("{}", notice);
    }

    if matches!(portal.view(), PortalView::ProfileSetup { .. }) {
        let name = prompt("Your name: ")?;
        let phone = prompt("Your phone: ")?;
        portal.save_profile(&name, &phone).await?;
    }

    if let PortalView::Dashboard { profile, reports, show_admin_panel } = portal.view() {
        println!("Welcome, {}", profile.name);
        if reports.is_empty() {
            println!("No reports yet.");
        }
        for report in reports {
            println!("{}  {}", report.file_name, report.url);
        }
        if show_admin_panel {
            println!("Admin access: reports can be uploaded for any phone.");
        }
    }

    Ok(())
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
