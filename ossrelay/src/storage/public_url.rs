use crate::config::StorageConfig;
use crate::relay::classify::ContentKind;

/// Builds the public URL returned for each stored object.
///
/// Images get the bucket's thumbnail processing style appended, binary models are linked
/// directly, and anything else has no public form.
#[derive(Debug, Clone)]
pub struct PublicUrls {
    base: String,
    thumbnail_style: String,
}

impl PublicUrls {
    pub fn new(bucket: &str, public_domain: &str, thumbnail_style: &str) -> Self {
        Self {
            base: format!("https://{bucket}.{public_domain}"),
            thumbnail_style: thumbnail_style.to_string(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(&config.bucket, &config.public_domain(), &config.thumbnail_style)
    }

    pub fn url_for(&self, key: &str, kind: ContentKind) -> String {
        match kind {
            ContentKind::Image => format!("{}/{}?x-oss-process=style/{}", self.base, key, self.thumbnail_style),
            ContentKind::ModelBinary => format!("{}/{}", self.base, key),
            ContentKind::Unknown => String::new(),
        }
    }
}
