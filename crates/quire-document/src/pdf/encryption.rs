// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Password-protection heuristic.
//
// No parsing: the whole buffer is read as latin1 text and searched for the
// `/Encrypt` trailer key plus at least one standard security handler marker.

/// Magic bytes every PDF starts with.
const PDF_HEADER: &[u8] = b"%PDF-";

const ENCRYPT_KEY: &str = "/Encrypt";

/// Entries of a standard-security-handler encryption dictionary.
const ENCRYPTION_MARKERS: &[&str] = &[
    "/Filter /Standard",
    "/V 1",
    "/V 2",
    "/V 3",
    "/V 4",
    "/V 5",
    "/R 2",
    "/R 3",
    "/R 4",
    "/R 5",
    "/R 6",
    "/P -",
    "/U (",
    "/O (",
];

/// Whether the buffer starts with `%PDF-`.
pub fn has_pdf_header(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_HEADER)
}

/// Whether the PDF looks password-protected.
///
/// Pure function of the input bytes.
pub fn is_password_protected(bytes: &[u8]) -> bool {
    let text = latin1(bytes);
    text.contains(ENCRYPT_KEY) && ENCRYPTION_MARKERS.iter().any(|marker| text.contains(marker))
}

/// One char per byte; every byte value is a valid latin1 code point.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypted_pdf() -> Vec<u8> {
        let mut bytes = b"%PDF-1.6\n%\xe2\xe3\xcf\xd3\n".to_vec();
        bytes.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
        bytes.extend_from_slice(b"5 0 obj\n<< /Filter /Standard /V 2 /R 3 /Length 128 /P -1340 ");
        bytes.extend_from_slice(b"/O (\x8f\x01) /U (\x12\x9a) >>\nendobj\n");
        bytes.extend_from_slice(b"trailer\n<< /Root 1 0 R /Encrypt 5 0 R >>\n%%EOF\n");
        bytes
    }

    #[test]
    fn header_check() {
        assert!(has_pdf_header(b"%PDF-1.7\n"));
        assert!(!has_pdf_header(b"GIF89a"));
        assert!(!has_pdf_header(b"%PD"));
    }

    #[test]
    fn detects_standard_security_handler() {
        assert!(is_password_protected(&encrypted_pdf()));
    }

    #[test]
    fn plain_pdf_is_not_protected() {
        let plain: &[u8] =
            b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF";
        assert!(!is_password_protected(plain));
    }

    #[test]
    fn encrypt_key_alone_is_not_enough() {
        let bytes = b"%PDF-1.4\n% mentions /Encrypt in a comment only\n%%EOF";
        assert!(!is_password_protected(bytes));
    }

    #[test]
    fn marker_without_encrypt_key_is_not_enough() {
        let bytes = b"%PDF-1.4\n<< /V 2 /R 3 >>\n%%EOF";
        assert!(!is_password_protected(bytes));
    }

    #[test]
    fn repeated_checks_agree() {
        let bytes = encrypted_pdf();
        let first = is_password_protected(&bytes);
        let second = is_password_protected(&bytes);
        assert_eq!(first, second);

        let plain = b"%PDF-1.4\n%%EOF".to_vec();
        assert_eq!(is_password_protected(&plain), is_password_protected(&plain));
    }
}
