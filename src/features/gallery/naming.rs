//! 文件名相关的纯函数：图片扩展名识别、自然排序与说明文字推导。
//!
//! 自然排序示例：`1.png` < `2.png` < `10.png`（数字段按数值比较，字母不区分大小写）。
//! 说明文字示例：`Bronco-Roger-Simmons.jpg` → "Bronco Roger Simmons"。

use std::cmp::Ordering;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

/// 文件扩展名（带点，保留原始大小写）；无扩展名时为空串
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default()
}

/// 按扩展名判断是否为图片（不区分大小写）
pub fn is_image_file(filename: &str, extensions: &[String]) -> bool {
    let ext = extension_of(filename).to_ascii_lowercase();
    !ext.is_empty() && extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// 自然排序比较
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => break,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let lhs = take_digits(&mut left);
                let rhs = take_digits(&mut right);
                match compare_digit_runs(&lhs, &rhs) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
            (Some(x), Some(y)) => {
                left.next();
                right.next();
                match fold_case(x).cmp(&fold_case(y)) {
                    Ordering::Equal => {}
                    other => return other,
                }
            }
        }
    }

    // 仅大小写或前导零不同：退回字节序，保证排序结果稳定
    a.cmp(b)
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// 由文件名推导说明文字：去掉扩展名，`-`/`_` 替换为空格并压缩多余空白
pub fn caption_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    stem.split(['-', '_', ' '])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
