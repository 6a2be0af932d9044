use thiserror::Error;

/// アップロード失敗時の既定メッセージ
pub const DEFAULT_UPLOAD_ERROR: &str = "Erro ao enviar a imagem";

#[derive(Error, Debug)]
pub enum FractureAssistError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("画像デコードエラー: {0}")]
    ImageDecode(String),

    /// ネットワーク到達不能・タイムアウトなど
    #[error("送信エラー: {0}")]
    UploadTransport(String),

    #[error("検出APIエラー (HTTP {status}): {message}")]
    UploadStatus { status: u16, message: String },

    #[error("APIレスポンスのパースに失敗: {0}")]
    ApiParse(String),

    #[error("履歴が見つかりません: {0}")]
    HistoryNotFound(String),

    #[error("PDF生成エラー: {0}")]
    PdfGeneration(String),

    #[error("入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] fracture_assist_common::Error),
}

impl FractureAssistError {
    /// 画面に出すアップロード失敗メッセージ。空なら既定文言
    pub fn upload_message(&self) -> String {
        let message = match self {
            Self::UploadTransport(message)
            | Self::UploadStatus { message, .. }
            | Self::ApiParse(message) => message.trim().to_string(),
            other => other.to_string(),
        };

        if message.is_empty() {
            DEFAULT_UPLOAD_ERROR.to_string()
        } else {
            message
        }
    }
}

impl From<dialoguer::Error> for FractureAssistError {
    fn from(e: dialoguer::Error) -> Self {
        Self::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FractureAssistError>;
