use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use tokio::{fs::File, io::AsyncWriteExt};

use crate::{
    client::Api,
    config::Config,
    error::Error,
    fetcher::Fetcher,
    models::{
        macros::params,
        thread::{ExportRecord, Post, Thread},
    },
    result::Result,
    walker::Walker,
};

/// Endpoint listing the threads of a forum.
pub const LIST_THREADS: &str = "forums.listThreads";

/// Endpoint listing the posts of a thread.
pub const LIST_POSTS: &str = "posts.list";

/// Exports every thread of `config.forum` into `config.directory`.
///
/// Threads are processed one at a time: all posts of a thread are fetched
/// before its file is written, and a thread's records are dropped once the
/// file is on disk. Rate limit errors are slept on according to `config`,
/// any other error stops the export and leaves already written files in place.
///
/// # Errors
///
/// Returns the first error that is not absorbed by the retry policy,
/// or any error writing an output file.
pub async fn export_forum<A: Api + ?Sized>(api: &A, config: &Config) -> Result<()> {
    let fetcher = Fetcher::new(api, config.sleep_time).with_policy(config.retry_policy);

    let mut threads = Walker::<_, Thread>::new(
        fetcher,
        LIST_THREADS,
        params! {"forum" => config.forum, "method" => "GET"},
    );

    while let Some(thread) = threads.next().await? {
        let id = thread.id().ok_or(Error::MissingField("id"))?;
        log::info!("Retrieving posts for '{}'({})", thread.display_title(), id);

        let posts = Walker::<_, Post>::new(
            fetcher,
            LIST_POSTS,
            params! {"thread" => id, "method" => "GET"},
        )
        .collect_all()
        .await?;

        let record = ExportRecord::new(thread, posts);
        let path = write_record(&config.directory, &id, &record).await?;
        log::debug!("wrote {} posts to {}", record.posts.len(), path.display());
    }

    Ok(())
}

/// Returns the file an export of thread `id` is written to.
pub fn record_path(directory: &Path, id: &str) -> PathBuf {
    directory.join(format!("{}.json", file_stem(id)))
}

/// Serializes `record` to `<directory>/<id>.json`, replacing any previous file.
///
/// The data goes to a hidden sibling file first and is renamed into place,
/// so a reader never sees a partially written export.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem operation fails.
pub async fn write_record(directory: &Path, id: &str, record: &ExportRecord) -> Result<PathBuf> {
    let bytes = serde_json::to_vec(record)?;
    let dest = record_path(directory, id);
    let tmp = directory.join(format!(".{}.json.tmp", file_stem(id)));

    let written = async {
        let mut file = File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await
    }
    .await;

    if let Err(e) = written {
        if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
            log::debug!("could not remove {}: {}", tmp.display(), cleanup);
        }
        return Err(e.into());
    }

    tokio::fs::rename(&tmp, &dest).await?;
    Ok(dest)
}

/// Makes an id safe to use as a file name.
///
/// Bytes outside `[A-Za-z0-9._-]` are percent-escaped, `%` included, so
/// distinct ids never share a file. Ids made only of dots are escaped
/// whole and the empty id becomes a lone `%`.
fn file_stem(id: &str) -> Cow<'_, str> {
    let safe = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.');
    let dots = id.bytes().all(|b| b == b'.');

    if !dots && id.bytes().all(safe) {
        return Cow::Borrowed(id);
    }

    let mut escaped = String::with_capacity(id.len() * 3);
    if id.is_empty() {
        escaped.push('%');
    }
    for b in id.bytes() {
        if safe(b) && !dots {
            escaped.push(char::from(b));
        } else {
            escaped.push_str(&format!("%{:02X}", b));
        }
    }
    log::warn!("thread id {:?} is written as {}.json", id, escaped);
    Cow::Owned(escaped)
}
