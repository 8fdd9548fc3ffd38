//! エージェントリポジトリの同期とパッチ適用
//!
//! どちらも外部コラボレーター（git）への同期・ブロッキング呼び出し。
//! 失敗はその場でrunを中断させます。

use anyhow::{Context, bail};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// 適用済みパッチを記録する台帳ファイル名
const PATCH_LEDGER: &str = "patches.txt";

/// リポジトリ同期の窓口
pub trait SourceSync {
    /// エージェントのコードを最新化する
    fn sync(&self) -> anyhow::Result<()>;
    /// 未適用のパッチを順に適用する
    fn apply_patches(&self) -> anyhow::Result<()>;
}

/// git リポジトリとして配置されたエージェントディレクトリ
pub struct GitSource {
    directory: PathBuf,
}

impl GitSource {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    fn run_git(&self, args: &[&str]) -> anyhow::Result<()> {
        let display_cmd = format!("git -C {} {}", self.directory.display(), args.join(" "));
        debug!(command = %display_cmd, "Invoking git");

        let output = Command::new("git")
            .arg("-C")
            .arg(&self.directory)
            .args(args)
            .output()
            .with_context(|| format!("git を実行できません: {}", display_cmd))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git コマンドが失敗しました: {}\n出力: {}", display_cmd, stderr.trim());
        }

        Ok(())
    }

    /// 台帳から適用済みパッチ名を読む
    fn applied_patches(&self) -> anyhow::Result<HashSet<String>> {
        let ledger = self.directory.join(PATCH_LEDGER);
        if !ledger.exists() {
            return Ok(HashSet::new());
        }

        let content = std::fs::read_to_string(&ledger)
            .with_context(|| format!("パッチ台帳を読めません: {}", ledger.display()))?;

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// 適用成功後に台帳へ追記する
    fn record_patch(&self, name: &str) -> anyhow::Result<()> {
        use std::io::Write;

        let ledger = self.directory.join(PATCH_LEDGER);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&ledger)
            .with_context(|| format!("パッチ台帳に書き込めません: {}", ledger.display()))?;
        writeln!(file, "{}", name)?;

        Ok(())
    }

    fn pending_patches(&self) -> anyhow::Result<Vec<PathBuf>> {
        let patches_dir = self.directory.join("patches");
        if !patches_dir.is_dir() {
            debug!("No patches directory, nothing to apply");
            return Ok(Vec::new());
        }

        let applied = self.applied_patches()?;

        let mut patches: Vec<PathBuf> = std::fs::read_dir(&patches_dir)
            .with_context(|| format!("patches ディレクトリを読めません: {}", patches_dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "patch"))
            .filter(|path| {
                patch_name(path).is_some_and(|name| !applied.contains(name))
            })
            .collect();

        // 適用順はファイル名順で固定
        patches.sort();

        Ok(patches)
    }
}

fn patch_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

impl SourceSync for GitSource {
    fn sync(&self) -> anyhow::Result<()> {
        info!(directory = %self.directory.display(), "Syncing agent repository");
        self.run_git(&["pull", "--ff-only"])
    }

    fn apply_patches(&self) -> anyhow::Result<()> {
        let patches = self.pending_patches()?;
        if patches.is_empty() {
            debug!("No pending patches");
            return Ok(());
        }

        info!(count = patches.len(), "Applying pending patches");

        for patch in &patches {
            let name = patch_name(patch)
                .with_context(|| format!("パッチ名を取得できません: {}", patch.display()))?;
            let patch_arg = patch.to_string_lossy();

            self.run_git(&["apply", patch_arg.as_ref()])
                .with_context(|| format!("パッチの適用に失敗: {}", name))?;

            // 成功したものだけ台帳に記録する（再実行時に二重適用しない）
            self.record_patch(name)?;
            info!(patch = name, "Patch applied");
        }

        Ok(())
    }
}
