use minijinja::{Environment, context};
use std::env;
use std::fs;
use std::path::PathBuf;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
struct TypeInfo {
    name: String,
    variant: String,
    bytes: usize,
    #[serde(default)]
    rust: Option<String>,
    #[serde(default)]
    widens_to: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct TypeList {
    types: Vec<TypeInfo>,
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    let yaml_path = manifest_dir.join("../supported_types.yaml");
    let template_path = manifest_dir.join("templates/data_types.jinja");

    // Read the yaml file
    let yaml_str = fs::read_to_string(&yaml_path)
        .expect("Unable to read supported_types.yaml");
    let type_list: TypeList = serde_yaml::from_str(&yaml_str)
        .expect("Failed to parse YAML");

    // every promotion target must name a declared variant
    for t in &type_list.types {
        for w in &t.widens_to {
            assert!(
                type_list.types.iter().any(|o| &o.variant == w),
                "{} widens to unknown variant {}", t.name, w
            );
        }
    }

    // Load the template from a file
    let template_source = fs::read_to_string(&template_path)
        .expect("Unable to read template file");

    let env = Environment::new();
    let tmpl = env.template_from_str(&template_source).expect("Invalid template");

    let rendered = tmpl.render(context! { types => type_list.types }).expect("Template rendering failed");

    let out = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set")).join("generated_data_types.rs");
    fs::write(&out, rendered)
        .expect("Unable to write generated file");

    // Tell cargo to rerun if files change
    println!("cargo:rerun-if-changed={}", yaml_path.display());
    println!("cargo:rerun-if-changed={}", template_path.display());
}
