use crate::request::Body;
use factify_core::types::UploadFile;

/// Encodes a single-file `multipart/form-data` body under field `field`.
///
/// Returns the body plus the matching `Content-Type` header value.
pub fn encode_file(field: &str, file: &UploadFile) -> (Body, String) {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::with_capacity(file.bytes.len() + 256);
    append_file(
        &mut body,
        &boundary,
        field,
        &file.filename,
        &file.mime_type,
        &file.bytes,
    );
    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    let content_type = format!("multipart/form-data; boundary={}", boundary);
    (
        Body::MultipartFormData {
            boundary,
            bytes: body,
        },
        content_type,
    )
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name,
            escape_quotes(filename)
        )
        .as_bytes(),
    );
    let mime_type = if mime_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        mime_type
    };
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

fn escape_quotes(filename: &str) -> String {
    filename.replace('"', "%22").replace(['\r', '\n'], "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(name: &str, mime: &str) -> UploadFile {
        UploadFile {
            filename: name.into(),
            mime_type: mime.into(),
            bytes: b"hello".to_vec(),
        }
    }

    #[test]
    fn encodes_single_file_part() {
        let (body, content_type) = encode_file("file", &upload("essay.txt", "text/plain"));
        let Body::MultipartFormData { boundary, bytes } = body else {
            panic!("expected multipart");
        };
        assert_eq!(
            content_type,
            format!("multipart/form-data; boundary={boundary}")
        );

        let s = String::from_utf8_lossy(&bytes);
        assert!(s.starts_with(&format!("--{boundary}\r\n")));
        assert!(s.contains("name=\"file\"; filename=\"essay.txt\""));
        assert!(s.contains("Content-Type: text/plain\r\n\r\nhello\r\n"));
        assert!(s.ends_with(&format!("--{boundary}--\r\n")));
    }

    #[test]
    fn blank_mime_falls_back_to_octet_stream() {
        let (body, _) = encode_file("file", &upload("blob", " "));
        let Body::MultipartFormData { bytes, .. } = body else {
            panic!("expected multipart");
        };
        assert!(String::from_utf8_lossy(&bytes).contains("application/octet-stream"));
    }

    #[test]
    fn quotes_in_filename_do_not_break_the_header() {
        let (body, _) = encode_file("file", &upload("a\"b.txt", "text/plain"));
        let Body::MultipartFormData { bytes, .. } = body else {
            panic!("expected multipart");
        };
        assert!(String::from_utf8_lossy(&bytes).contains("filename=\"a%22b.txt\""));
    }
}
