use wsync::path::{FsPath, FsPathBuf};

pub fn temp_path(prefix: Option<&str>, ext: Option<&str>) -> FsPathBuf {
    use rand::{distributions::Alphanumeric, Rng};

    let mut filename = String::new();
    if let Some(prefix) = prefix {
        filename.push_str(prefix);
        filename.push('-');
    }
    let rnd: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect();
    filename.push_str(&rnd);
    if let Some(ext) = ext {
        filename.push('.');
        filename.push_str(ext);
    }
    let mut p = std::env::temp_dir();
    p.push(filename);
    p.try_into().unwrap()
}

/// Temporary directory, removed on drop
pub struct TempDir {
    path: FsPathBuf,
}

impl TempDir {
    pub async fn new(prefix: &str) -> Self {
        let path = temp_path(Some(prefix), None);
        tokio::fs::create_dir_all(&path).await.unwrap();
        let path = tokio::fs::canonicalize(&path).await.unwrap();
        Self {
            path: path.try_into().unwrap(),
        }
    }

    pub fn path(&self) -> &FsPath {
        &self.path
    }

    pub fn join(&self, rel: &str) -> FsPathBuf {
        self.path.join(rel)
    }

    pub async fn write(&self, rel: &str, content: &str) -> FsPathBuf {
        let path = self.join(rel);
        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.unwrap();
        }
        tokio::fs::write(&path, content).await.unwrap();
        path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}
