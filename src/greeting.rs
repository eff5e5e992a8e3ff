//! Hello-world basics printed by the demo binary.

/// Greet someone by name.
pub fn greet(name: &str) -> String {
    format!("Hello, {name}!")
}

pub fn sum(numbers: &[i64]) -> i64 {
    numbers.iter().sum()
}

/// Lines the demo prints before offloading anything.
pub fn hello_lines(name: &str, numbers: &[i64]) -> Vec<String> {
    vec![
        "Hello World from Rust!".to_string(),
        greet(name),
        format!("Numbers: {numbers:?}"),
        format!("Sum of numbers: {}", sum(numbers)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greet_formats_name() {
        assert_eq!(greet("Developer"), "Hello, Developer!");
    }

    #[test]
    fn sum_of_numbers() {
        assert_eq!(sum(&[1, 2, 3, 4, 5]), 15);
        assert_eq!(sum(&[]), 0);
    }

    #[test]
    fn hello_lines_include_greeting_and_sum() {
        let lines = hello_lines("Ada", &[1, 2, 3]);
        assert_eq!(lines[1], "Hello, Ada!");
        assert_eq!(lines[2], "Numbers: [1, 2, 3]");
        assert_eq!(lines[3], "Sum of numbers: 6");
    }
}
