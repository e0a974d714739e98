use autolocale_mt::{
    DeepLProvider, Formality, MachineTranslator, MockMode, MockTranslator, TranslationSettings,
    deepl::API_KEY_ENV, normalize_locale,
};
use clap::{Arg, Command};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("autolocale-mt")
        .version("0.1.0")
        .about("Translate a single text through the autolocale translation gateway")
        .arg(
            Arg::new("text")
                .help("Source text to translate")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("target-locale")
                .help("Target language code (e.g., fr, lt, pt-br)")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("source-locale")
                .long("source")
                .short('s')
                .help("Source language code (default: detected by the vendor)"),
        )
        .arg(
            Arg::new("formality")
                .long("formality")
                .short('f')
                .help("Formality: more, less, prefer_more, prefer_less"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use mock translator instead of DeepL")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Show request details")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let text = matches
        .get_one::<String>("text")
        .ok_or("Missing source text")?;
    let target_locale = matches
        .get_one::<String>("target-locale")
        .ok_or("Missing target locale")?;
    let source_locale = matches.get_one::<String>("source-locale").map(String::as_str);
    let use_mock = matches.get_flag("mock");
    let verbose = matches.get_flag("verbose");

    let settings = TranslationSettings {
        formality: matches
            .get_one::<String>("formality")
            .map(|f| f.parse::<Formality>())
            .transpose()?,
        ..Default::default()
    };

    if verbose {
        println!("📝 Source: \"{}\"", text);
        println!(
            "🌍 {} → {}",
            source_locale.map(normalize_locale).unwrap_or_else(|| "auto".to_string()),
            normalize_locale(target_locale)
        );
        if !settings.is_empty() {
            println!("⚙️  Settings: {:?}", settings);
        }
        println!();
    }

    let translator: Box<dyn MachineTranslator> = if use_mock {
        Box::new(MockTranslator::new(MockMode::Suffix))
    } else {
        if env::var(API_KEY_ENV).is_err() {
            eprintln!("❌ {} environment variable not set", API_KEY_ENV);
            eprintln!("   Set it with: export {}=your_api_key", API_KEY_ENV);
            eprintln!("   Or use --mock to use mock translator");
            return Err("Missing API key".into());
        }
        Box::new(DeepLProvider::from_env()?)
    };

    let translated = match translator
        .translate(text, source_locale, target_locale, &settings)
        .await
    {
        Ok(result) => result,
        Err(e) => {
            eprintln!("❌ {} failed: {}", translator.provider_name(), e);
            return Err(e.into());
        }
    };

    if verbose {
        println!("🔧 Translated by {}:", translator.provider_name());
    }
    println!("{}", translated);

    Ok(())
}
