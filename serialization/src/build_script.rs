//
// Copyright (c) 2019 Stegos AG
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Helper for `build.rs` of crates which ship `.proto` files.
//!
//! Generated modules are written to `$OUT_DIR/<out_prefix>/` together with a
//! `mod.rs`, so the crate can pull them in with
//! `include!(concat!(env!("OUT_DIR"), "/protos/mod.rs"))`.

use protobuf_codegen_pure::{Args, Customize};
use std::{
    env,
    ffi::OsStr,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

fn get_protos(path: &str) -> Vec<PathBuf> {
    let path: &Path = path.as_ref();
    if path.extension() == Some(OsStr::new("proto")) {
        return vec![path.into()];
    }
    let mut protos: Vec<PathBuf> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| {
            let e = e.ok()?;
            if e.path().extension()? == "proto" {
                Some(e.path().into())
            } else {
                None
            }
        })
        .collect();
    // Keep mod.rs stable between builds.
    protos.sort();
    protos
}

fn generate_mod_rs(out_dir: &Path, protos: &[PathBuf]) {
    let content = protos
        .iter()
        .map(|proto| {
            let mod_name = proto
                .file_stem()
                .and_then(OsStr::to_str)
                .expect(".proto file name is not convertible to &str");
            format!("pub mod {};\n", mod_name)
        })
        .collect::<String>();

    let dest_path = out_dir.join("mod.rs");
    let mut file = File::create(dest_path).expect("Unable to create output file");
    file.write_all(content.as_bytes())
        .expect("Unable to write data to file");
}

/// Compiles every `.proto` found under `input_dir`.
pub fn build_protobuf(input_dir: &str, out_prefix: &str) {
    let out_dir =
        PathBuf::from(env::var("OUT_DIR").expect("Unable to get OUT_DIR")).join(out_prefix);
    fs::create_dir_all(&out_dir).expect("Unable to create output dir");

    let protos = get_protos(input_dir);
    generate_mod_rs(&out_dir, &protos);

    let out_dir_str = out_dir.to_str().expect("OUT_DIR is not valid UTF-8");
    let protos_str = protos
        .iter()
        .map(|p| p.to_str())
        .collect::<Option<Vec<_>>>()
        .expect("proto path is not valid UTF-8");

    protobuf_codegen_pure::run(Args {
        out_dir: out_dir_str,
        input: &protos_str,
        includes: &[input_dir],
        customize: Customize {
            ..Default::default()
        },
    })
    .expect("protoc");

    println!("cargo:rerun-if-changed={}", input_dir);
}
