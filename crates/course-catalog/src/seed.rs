use crate::model::{Course, Shift};

/// Courses shown before any schedule has been imported.
pub fn seed_courses() -> Vec<Course> {
    vec![
        Course {
            id: "1".to_string(),
            name: "Eletricista Industrial".to_string(),
            category: "Eletroeletrônica".to_string(),
            hours: "380h".to_string(),
            installments: 10,
            installment_value: 189.90,
            total_value: 1899.00,
            dates: "15/03 a 20/07".to_string(),
            shift: Shift::Evening,
            unit: "Escola SENAI Antônio Simões".to_string(),
            is_new: false,
        },
        Course {
            id: "2".to_string(),
            name: "Mecânico de Motocicletas".to_string(),
            category: "Automotiva".to_string(),
            hours: "200h".to_string(),
            installments: 6,
            installment_value: 150.00,
            total_value: 900.00,
            dates: "01/04 a 01/06".to_string(),
            shift: Shift::Afternoon,
            unit: "Escola SENAI Demóstenes Travessa".to_string(),
            is_new: false,
        },
        Course {
            id: "3".to_string(),
            name: "Excel Avançado".to_string(),
            category: "Tecnologia da Informação".to_string(),
            hours: "40h".to_string(),
            installments: 2,
            installment_value: 120.00,
            total_value: 240.00,
            dates: "10/03 a 20/03".to_string(),
            shift: Shift::Evening,
            unit: "EAD".to_string(),
            is_new: false,
        },
    ]
}
