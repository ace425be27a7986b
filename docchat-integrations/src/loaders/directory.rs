//! Directory-based document loader.

use docchat_core::{
    DocchatError, Node, Result,
    types::{FILE_NAME_KEY, FILE_PATH_KEY},
};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Default maximum chunk length in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Configuration for [`DirectoryLoader`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// File extensions to load (lowercase, without the dot)
    pub include_extensions: Vec<String>,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Maximum directory depth, unlimited when `None`
    pub max_depth: Option<usize>,

    /// Skip unreadable files instead of failing the load
    pub continue_on_error: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            include_extensions: vec!["txt".to_string(), "md".to_string()],
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_depth: None,
            continue_on_error: true,
        }
    }
}

impl LoaderConfig {
    /// Set the maximum chunk length.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the maximum traversal depth.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Replace the list of loaded extensions.
    #[must_use]
    pub fn with_include_extensions(mut self, extensions: Vec<String>) -> Self {
        self.include_extensions = extensions;
        self
    }
}

/// Loads text documents from a directory tree and splits them into nodes.
///
/// Every node records the source `file_name` and the `file_path` relative to
/// the loader root, plus its position within the file.
///
/// # Examples
///
/// ```rust,no_run
/// use docchat_integrations::loaders::DirectoryLoader;
///
/// # async fn example() -> docchat_core::Result<()> {
/// let loader = DirectoryLoader::new("./data")?;
/// let nodes = loader.load().await?;
/// println!("Loaded {} chunks", nodes.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    path: PathBuf,
    config: LoaderConfig,
}

impl DirectoryLoader {
    /// Create a loader for an existing directory.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::with_config(path, LoaderConfig::default())
    }

    /// Create a loader with custom configuration.
    pub fn with_config<P: AsRef<Path>>(path: P, config: LoaderConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(DocchatError::not_found(format!(
                "Data directory {}",
                path.display()
            )));
        }
        if !path.is_dir() {
            return Err(DocchatError::configuration(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }
        if config.chunk_size == 0 {
            return Err(DocchatError::configuration("chunk_size must be positive"));
        }
        Ok(Self { path, config })
    }

    /// The directory being loaded.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every matching file and split it into nodes.
    ///
    /// Files are visited in path order so repeated loads produce the same
    /// node sequence.
    pub async fn load(&self) -> Result<Vec<Node>> {
        let mut files = Vec::new();
        self.find_files_recursive(&self.path, 0, &mut files).await?;
        files.sort();
        info!(
            files = files.len(),
            path = %self.path.display(),
            "Loading documents from directory"
        );

        let mut nodes = Vec::new();
        for file in &files {
            match fs::read_to_string(file).await {
                Ok(text) => nodes.extend(self.file_nodes(file, &text)),
                Err(e) if self.config.continue_on_error => {
                    warn!(file = %file.display(), "Skipping unreadable file: {e}");
                }
                Err(e) => return Err(e.into()),
            }
        }

        info!(nodes = nodes.len(), "Loaded document chunks");
        Ok(nodes)
    }

    fn file_nodes(&self, file: &Path, text: &str) -> Vec<Node> {
        let file_name = file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file_path = file
            .strip_prefix(&self.path)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");

        let chunks = chunk_text(text, self.config.chunk_size);
        debug!(file = %file_name, chunks = chunks.len(), "Split file");
        chunks
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| {
                Node::new(chunk)
                    .with_metadata(FILE_NAME_KEY, file_name.clone())
                    .with_metadata(FILE_PATH_KEY, file_path.clone())
                    .with_chunk_index(index)
            })
            .collect()
    }

    fn find_files_recursive<'a>(
        &'a self,
        dir: &'a Path,
        depth: usize,
        files: &'a mut Vec<PathBuf>,
    ) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if self.config.max_depth.is_some_and(|max| depth >= max) {
                debug!(dir = %dir.display(), "Reached maximum depth");
                return Ok(());
            }

            let mut entries = fs::read_dir(dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    self.find_files_recursive(&path, depth + 1, files).await?;
                } else if file_type.is_file() && self.should_include_file(&path) {
                    files.push(path);
                }
            }
            Ok(())
        })
    }

    fn should_include_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .is_some_and(|ext| self.config.include_extensions.contains(&ext))
    }
}

/// Split text into chunks of at most `chunk_size` characters.
///
/// Paragraphs (separated by blank lines) are merged greedily. A paragraph
/// longer than `chunk_size` is split on whitespace, and a single word longer
/// than `chunk_size` is cut at character boundaries.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    let paragraphs = text
        .split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty());

    for paragraph in paragraphs {
        for piece in split_long(paragraph, chunk_size) {
            let joined_len = if current.is_empty() {
                piece.chars().count()
            } else {
                current.chars().count() + 2 + piece.chars().count()
            };
            if joined_len > chunk_size && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(&piece);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn split_long(paragraph: &str, chunk_size: usize) -> Vec<String> {
    if paragraph.chars().count() <= chunk_size {
        return vec![paragraph.to_string()];
    }

    let mut pieces = Vec::new();
    let mut current = String::new();
    for word in paragraph.split_whitespace() {
        let word_len = word.chars().count();
        if word_len > chunk_size {
            if !current.is_empty() {
                pieces.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            pieces.extend(chars.chunks(chunk_size).map(|c| c.iter().collect::<String>()));
            continue;
        }
        let current_len = current.chars().count();
        if current_len > 0 && current_len + 1 + word_len > chunk_size {
            pieces.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
