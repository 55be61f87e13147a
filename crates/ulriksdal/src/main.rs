#![forbid(unsafe_code)]

//! Ulriksdal CLI: exclusive canonicalization, algorithm resolution and
//! signature inspection.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use ulriksdal_core::{algorithm, Error};
use ulriksdal_crypto::RustCryptoProvider;
use ulriksdal_dsig::{
    catalog, AlgorithmParameters, FactoryConfig, KeyInfoContent, ObjectContent, ValidateContext,
    XmlSignature, XmlSignatureFactory,
};
use ulriksdal_transforms::{ExcC14nParameterSpec, SignatureInput};
use ulriksdal_xml::{DomNode, XmlDocument};

#[derive(Parser)]
#[command(
    name = "ulriksdal",
    about = "Ulriksdal: XML-DSig algorithm factory and exclusive C14N",
    version
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Canonicalize an XML document with exclusive C14N
    C14n {
        /// Input XML file
        file: PathBuf,

        /// Keep comments
        #[arg(long = "with-comments")]
        with_comments: bool,

        /// Force a namespace prefix into the output (repeatable; `#default`
        /// names the default namespace)
        #[arg(short, long = "prefix")]
        prefix: Vec<String>,

        /// Canonicalize only the element carrying this Id
        #[arg(long = "element-id")]
        element_id: Option<String>,

        /// Refuse DTDs in the input
        #[arg(long)]
        secure: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve an algorithm URI through the factory
    Resolve {
        #[arg(value_enum)]
        family: Family,

        /// Algorithm URI
        uri: String,

        /// Apply the secure validation policy
        #[arg(long)]
        secure: bool,
    },

    /// Unmarshal a <Signature> document and print its structure
    Inspect {
        /// Input XML file
        file: PathBuf,

        /// Apply the secure validation policy
        #[arg(long)]
        secure: bool,
    },

    /// Digest a file and print the base64 digest value
    Digest {
        /// Digest algorithm URI
        uri: String,

        /// Input file
        file: PathBuf,
    },

    /// List supported algorithm URIs
    Info,
}

#[derive(Clone, Copy, ValueEnum)]
enum Family {
    Digest,
    Signature,
    Transform,
    C14n,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::C14n {
            file,
            with_comments,
            prefix,
            element_id,
            secure,
            output,
        } => cmd_c14n(&file, with_comments, prefix, element_id.as_deref(), secure, output),
        Commands::Resolve {
            family,
            uri,
            secure,
        } => cmd_resolve(family, &uri, secure),
        Commands::Inspect { file, secure } => cmd_inspect(&file, secure),
        Commands::Digest { uri, file } => cmd_digest(&uri, &file),
        Commands::Info => cmd_info(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn factory(secure: bool) -> XmlSignatureFactory {
    XmlSignatureFactory::new(FactoryConfig::default().with_secure_validation(secure))
}

fn cmd_c14n(
    file: &Path,
    with_comments: bool,
    prefixes: Vec<String>,
    element_id: Option<&str>,
    secure: bool,
    output: Option<PathBuf>,
) -> Result<(), Error> {
    let uri = if with_comments {
        algorithm::EXC_C14N_WITH_COMMENTS
    } else {
        algorithm::EXC_C14N
    };
    let params = if prefixes.is_empty() {
        None
    } else {
        Some(AlgorithmParameters::ExcC14n(ExcC14nParameterSpec::new(prefixes)?))
    };
    let method = factory(secure).new_canonicalization_method(uri, params)?;

    let input = match element_id {
        None => SignatureInput::from_octets(std::fs::read(file).map_err(|e| with_path(file, e))?),
        Some(id) => SignatureInput::from_element(find_by_id(read_document(file)?, id)?),
    }
    .with_secure_validation(secure);
    let base_uri = file.display().to_string();

    match output {
        Some(path) => {
            let mut sink = File::create(&path).map_err(|e| with_path(&path, e))?;
            method.canonicalize(input, None, Some(&base_uri), Some(&mut sink))?;
        }
        None => {
            let stdout = io::stdout();
            let mut sink = stdout.lock();
            method.canonicalize(input, None, Some(&base_uri), Some(&mut sink))?;
            sink.flush()?;
        }
    }
    Ok(())
}

fn cmd_resolve(family: Family, uri: &str, secure: bool) -> Result<(), Error> {
    let factory = factory(secure);
    match family {
        Family::Digest => {
            let method = factory.new_digest_method(uri, None)?;
            println!("digest {}", method.algorithm());
        }
        Family::Signature => {
            let method = factory.new_signature_method(uri, None)?;
            println!("signature {} ({:?})", method.algorithm(), method.family());
        }
        Family::Transform => {
            let transform = factory.new_transform(uri, None)?;
            println!("transform {}", transform.algorithm());
        }
        Family::C14n => {
            let method = factory.new_canonicalization_method(uri, None)?;
            println!("canonicalization {}", method.algorithm());
        }
    }
    Ok(())
}

fn cmd_inspect(file: &Path, secure: bool) -> Result<(), Error> {
    let dom = read_document(file)?.into_dom()?;
    let ctx = ValidateContext::new(dom).with_secure_validation(secure);
    let signature = factory(secure).unmarshal_xml_signature(&ctx)?;
    print_signature(&signature);
    Ok(())
}

fn cmd_digest(uri: &str, file: &Path) -> Result<(), Error> {
    let method = factory(false).new_digest_method(uri, None)?;
    let data = std::fs::read(file).map_err(|e| with_path(file, e))?;
    let value = method.digest(&RustCryptoProvider, &data)?;
    println!("{}", base64::engine::general_purpose::STANDARD.encode(value));
    Ok(())
}

fn cmd_info() -> Result<(), Error> {
    println!("Digest algorithms:");
    for uri in catalog::digest_uris() {
        println!("  {uri}");
    }
    println!();
    println!("Signature algorithms:");
    for uri in catalog::signature_uris() {
        println!("  {uri}");
    }
    println!();
    println!("Transforms:");
    for uri in catalog::transform_uris() {
        println!("  {uri}");
    }
    println!();
    println!("Canonicalization methods:");
    for uri in catalog::canonicalization_uris() {
        println!("  {uri}");
    }
    Ok(())
}

// ── Utility functions ────────────────────────────────────────────────

fn with_path(path: &Path, e: io::Error) -> Error {
    Error::Io(io::Error::new(e.kind(), format!("{}: {e}", path.display())))
}

fn read_document(path: &Path) -> Result<XmlDocument, Error> {
    let bytes = std::fs::read(path).map_err(|e| with_path(path, e))?;
    Ok(XmlDocument::parse_bytes(&bytes)?.with_base_uri(path.display().to_string()))
}

fn find_by_id(document: XmlDocument, id: &str) -> Result<DomNode, Error> {
    let node_id = {
        let doc = document.parse_doc()?;
        doc.descendants()
            .find(|n| {
                n.is_element()
                    && ["Id", "ID", "id"]
                        .iter()
                        .any(|attr| n.attribute(*attr) == Some(id))
            })
            .map(|n| n.id())
            .ok_or_else(|| Error::MalformedStructure(format!("no element with Id {id}")))?
    };
    DomNode::new(Arc::new(document), node_id)
}

fn print_signature(signature: &XmlSignature) {
    let si = signature.signed_info();
    println!("Signature {}", signature.id().unwrap_or("-"));
    println!("  CanonicalizationMethod {}", si.canonicalization_method().algorithm());
    if let Some(AlgorithmParameters::ExcC14n(spec)) = si.canonicalization_method().params() {
        println!("    InclusiveNamespaces {}", spec.prefixes().join(" "));
    }
    println!("  SignatureMethod {}", si.signature_method().algorithm());
    if let Some(AlgorithmParameters::Hmac(spec)) = si.signature_method().params() {
        println!("    HMACOutputLength {}", spec.output_length());
    }
    for reference in si.references() {
        println!("  Reference {}", reference.uri().unwrap_or("-"));
        for transform in reference.transforms() {
            println!("    Transform {}", transform.algorithm());
        }
        println!("    DigestMethod {}", reference.digest_method().algorithm());
    }
    println!(
        "  SignatureValue {} bytes",
        signature.signature_value().value().len()
    );
    if let Some(key_info) = signature.key_info() {
        for content in key_info.content() {
            match content {
                KeyInfoContent::KeyName(name) => println!("  KeyName {name}"),
                KeyInfoContent::Xml(structure) => println!("  KeyInfo {}", structure.kind()),
            }
        }
    }
    for object in signature.objects() {
        println!("  Object {}", object.id().unwrap_or("-"));
        for content in object.content() {
            match content {
                ObjectContent::Manifest(m) => {
                    println!("    Manifest with {} references", m.references().len())
                }
                ObjectContent::SignatureProperties(p) => {
                    println!("    SignatureProperties with {} properties", p.properties().len())
                }
                ObjectContent::Xml(structure) => println!("    {}", structure.kind()),
            }
        }
    }
}
