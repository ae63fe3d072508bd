//! Lookup of compiled contract artifacts by contract name.
//!
//! Both hardhat (`artifacts/contracts/Foo.sol/Foo.json`) and foundry
//! (`out/Foo.sol/Foo.json`) build layouts are understood. Debug files
//! (`Foo.dbg.json`) never match and `build-info` is not searched.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    str::FromStr,
};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;

use crate::{Error, Result};

const BUILD_INFO_DIR: &str = "build-info";

/// A compiled contract that knows how to build its own creation transaction.
#[derive(Debug, Clone)]
pub struct ContractFactory {
    /// Name of the contract.
    pub contract_name: String,

    /// Source file the contract was compiled from.
    pub source_name: String,

    /// Interface of the contract.
    pub abi: Abi,

    /// Creation bytecode.
    pub bytecode: Bytes,
}

impl ContractFactory {
    /// Fully qualified name, `Source.sol:Name`.
    pub fn fully_qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }
}

// source file -> library name -> offsets
type LinkReferences = BTreeMap<String, BTreeMap<String, serde_json::Value>>;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(String),
    #[serde(rename_all = "camelCase")]
    Object {
        object: String,
        #[serde(default)]
        link_references: LinkReferences,
    },
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArtifact {
    contract_name: Option<String>,
    source_name: Option<String>,
    abi: Abi,
    bytecode: RawBytecode,
    #[serde(default)]
    link_references: LinkReferences,
}

impl RawArtifact {
    fn into_factory(self, name: &str, path: &Path) -> Result<ContractFactory> {
        let source_name = source_name(self.source_name, path);

        let (bytecode, mut link_references) = match self.bytecode {
            RawBytecode::Hex(object) => (object, BTreeMap::new()),
            RawBytecode::Object {
                object,
                link_references,
            } => (object, link_references),
        };
        link_references.extend(self.link_references);

        if bytecode.is_empty() || bytecode == "0x" {
            return Err(Error::AbstractContract(name.to_string()));
        }

        if !link_references.is_empty() {
            let libraries = link_references
                .iter()
                .flat_map(|(source, libs)| libs.keys().map(move |lib| format!("{source}:{lib}")))
                .collect();

            return Err(Error::UnlinkedLibraries {
                name: name.to_string(),
                libraries,
            });
        }

        let bytecode = Bytes::from_str(&bytecode).map_err(|e| Error::InvalidBytecode {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        Ok(ContractFactory {
            contract_name: self.contract_name.unwrap_or_else(|| name.to_string()),
            source_name,
            abi: self.abi,
            bytecode,
        })
    }
}

// Foundry artifacts carry no source name, it is the directory they live in.
fn source_name(declared: Option<String>, path: &Path) -> String {
    declared.unwrap_or_else(|| {
        path.parent()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

fn dir_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::ArtifactsDir {
        path: path.to_path_buf(),
        source,
    }
}

// Symlinked directories are not followed.
async fn collect_candidates(root: &Path, file_name: &str) -> Result<Vec<PathBuf>> {
    let mut dirs = vec![root.to_path_buf()];
    let mut candidates = vec![];

    while let Some(dir) = dirs.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await.map_err(dir_error(&dir))?;

        while let Some(entry) = entries.next_entry().await.map_err(dir_error(&dir))? {
            let file_type = entry.file_type().await.map_err(dir_error(&dir))?;
            let entry_name = entry.file_name();

            if file_type.is_dir() {
                if entry_name.to_str() != Some(BUILD_INFO_DIR) {
                    dirs.push(entry.path());
                }
            } else if entry_name.to_str() == Some(file_name) {
                candidates.push(entry.path());
            }
        }
    }

    candidates.sort();

    Ok(candidates)
}

/// Resolve the factory of contract `name` from the artifacts under `artifacts_path`.
///
/// # Arguments
///
/// * `artifacts_path`: Root of the build output, searched recursively
/// * `name`: Name of the contract
pub async fn contract_factory(artifacts_path: &Path, name: &str) -> Result<ContractFactory> {
    let file_name = format!("{name}.json");

    let candidates = collect_candidates(artifacts_path, &file_name).await?;

    let mut factories = vec![];

    for path in candidates {
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(dir_error(&path))?;

        let raw: RawArtifact =
            serde_json::from_str(&contents).map_err(|source| Error::InvalidArtifact {
                path: path.clone(),
                source,
            })?;

        if raw.contract_name.as_deref().is_some_and(|n| n != name) {
            vlog::debug!("Skipping {path:?}, it holds a different contract");
            continue;
        }

        vlog::debug!("Found artifact for {name} at {path:?}");
        factories.push((path, raw));
    }

    match factories.len() {
        0 => Err(Error::ArtifactNotFound {
            name: name.to_string(),
            path: artifacts_path.to_path_buf(),
        }),
        1 => {
            let (path, raw) = factories.remove(0);
            raw.into_factory(name, &path)
        }
        _ => {
            let candidates = factories
                .into_iter()
                .map(|(path, raw)| format!("{}:{name}", source_name(raw.source_name, &path)))
                .collect();

            Err(Error::AmbiguousArtifact {
                name: name.to_string(),
                candidates,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    const ABI: &str = r#"[{"inputs":[],"stateMutability":"nonpayable","type":"constructor"}]"#;

    fn write(root: &Path, rel: &str, value: serde_json::Value) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, value.to_string()).unwrap();
    }

    fn hardhat(name: &str, source: &str, bytecode: &str) -> serde_json::Value {
        json!({
            "_format": "hh-sol-artifact-1",
            "contractName": name,
            "sourceName": source,
            "abi": serde_json::from_str::<serde_json::Value>(ABI).unwrap(),
            "bytecode": bytecode,
            "deployedBytecode": "0x00",
            "linkReferences": {},
            "deployedLinkReferences": {}
        })
    }

    #[tokio::test]
    async fn resolves_hardhat_artifact() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "contracts/YourContract.sol/YourContract.json",
            hardhat("YourContract", "contracts/YourContract.sol", "0x6080604052"),
        );
        write(
            dir.path(),
            "contracts/YourContract.sol/YourContract.dbg.json",
            json!({"_format": "hh-sol-dbg-1", "buildInfo": "../../build-info/abc.json"}),
        );
        write(dir.path(), "build-info/YourContract.json", json!({"output": {}}));

        let factory = contract_factory(dir.path(), "YourContract").await.unwrap();

        assert_eq!(factory.contract_name, "YourContract");
        assert_eq!(
            factory.fully_qualified_name(),
            "contracts/YourContract.sol:YourContract"
        );
        assert_eq!(factory.bytecode.to_vec(), vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        assert!(factory.abi.constructor.is_some());
    }

    #[tokio::test]
    async fn resolves_foundry_artifact() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "Counter.sol/Counter.json",
            json!({
                "abi": [],
                "bytecode": { "object": "0x6001", "linkReferences": {} },
                "deployedBytecode": { "object": "0x6001", "linkReferences": {} }
            }),
        );

        let factory = contract_factory(dir.path(), "Counter").await.unwrap();

        assert_eq!(factory.fully_qualified_name(), "Counter.sol:Counter");
        assert_eq!(factory.bytecode.to_vec(), vec![0x60, 0x01]);
    }

    #[tokio::test]
    async fn unknown_contract() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "contracts/Token.sol/Token.json",
            hardhat("Token", "contracts/Token.sol", "0x00"),
        );

        match contract_factory(dir.path(), "YourContract").await {
            Err(Error::ArtifactNotFound { name, path }) => {
                assert_eq!(name, "YourContract");
                assert_eq!(path, dir.path());
            }
            other => panic!("expected ArtifactNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_artifacts_dir() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("artifacts");

        let err = contract_factory(&missing, "YourContract").await.unwrap_err();

        assert!(matches!(err, Error::ArtifactsDir { path, .. } if path == missing));
    }

    #[tokio::test]
    async fn ambiguous_contract() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "contracts/A.sol/Token.json",
            hardhat("Token", "contracts/A.sol", "0x00"),
        );
        write(
            dir.path(),
            "contracts/B.sol/Token.json",
            hardhat("Token", "contracts/B.sol", "0x00"),
        );

        match contract_factory(dir.path(), "Token").await {
            Err(Error::AmbiguousArtifact { candidates, .. }) => assert_eq!(
                candidates,
                vec!["contracts/A.sol:Token", "contracts/B.sol:Token"]
            ),
            other => panic!("expected AmbiguousArtifact, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn ambiguous_foundry_contract() {
        let dir = TempDir::new().unwrap();
        let foundry = json!({
            "abi": [],
            "bytecode": { "object": "0x6001", "linkReferences": {} }
        });
        write(dir.path(), "A.sol/Token.json", foundry.clone());
        write(dir.path(), "B.sol/Token.json", foundry);

        match contract_factory(dir.path(), "Token").await {
            Err(Error::AmbiguousArtifact { candidates, .. }) => {
                assert_eq!(candidates, vec!["A.sol:Token", "B.sol:Token"])
            }
            other => panic!("expected AmbiguousArtifact, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlinked_dirs_are_not_followed() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "contracts/YourContract.sol/YourContract.json",
            hardhat("YourContract", "contracts/YourContract.sol", "0x6001"),
        );
        std::os::unix::fs::symlink(dir.path(), dir.path().join("contracts/loop")).unwrap();

        let factory = contract_factory(dir.path(), "YourContract").await.unwrap();

        assert_eq!(
            factory.fully_qualified_name(),
            "contracts/YourContract.sol:YourContract"
        );
    }

    #[tokio::test]
    async fn abstract_contract() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "contracts/IToken.sol/IToken.json",
            hardhat("IToken", "contracts/IToken.sol", "0x"),
        );

        let err = contract_factory(dir.path(), "IToken").await.unwrap_err();

        assert!(matches!(err, Error::AbstractContract(name) if name == "IToken"));
    }

    #[tokio::test]
    async fn unlinked_libraries() {
        let dir = TempDir::new().unwrap();
        let mut artifact = hardhat(
            "Vault",
            "contracts/Vault.sol",
            "0x73__$e0b5c1fdd0c2d1a0ac5e4b8b6b0c5e4f2d$__6000",
        );
        artifact["linkReferences"] = json!({
            "contracts/Math.sol": { "Math": [{ "length": 20, "start": 1 }] }
        });
        write(dir.path(), "contracts/Vault.sol/Vault.json", artifact);

        match contract_factory(dir.path(), "Vault").await {
            Err(Error::UnlinkedLibraries { name, libraries }) => {
                assert_eq!(name, "Vault");
                assert_eq!(libraries, vec!["contracts/Math.sol:Math"]);
            }
            other => panic!("expected UnlinkedLibraries, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Broken.sol/Broken.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let err = contract_factory(dir.path(), "Broken").await.unwrap_err();

        assert!(matches!(err, Error::InvalidArtifact { path: p, .. } if p == path));
    }
}
